// Application layer - Session state machine and use cases
pub mod bulk_fetch;
pub mod dashboard_runtime;
pub mod query_coordinator;
pub mod render_surface;
pub mod render_sync;
pub mod session;
pub mod stream_ingestor;

#[cfg(test)]
pub(crate) mod testing;
