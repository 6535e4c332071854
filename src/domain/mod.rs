// Domain layer - Time series, sensors and view mode
pub mod error;
pub mod events;
pub mod mode;
pub mod sensor_registry;
pub mod series_buffer;
pub mod telemetry;
