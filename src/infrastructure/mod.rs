// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_bulk_fetch;
pub mod push_channel;
