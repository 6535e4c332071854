// Bulk-fetch trait for historical data access
use crate::domain::telemetry::{DateRange, PreloadBatch, SensorReading, SummaryStats};
use async_trait::async_trait;

#[async_trait]
pub trait BulkFetch: Send + Sync {
    /// Up to `limit` of the most recent readings, oldest first, plus the
    /// headline numbers when the backend returns them alongside.
    async fn preload(&self, limit: usize) -> anyhow::Result<PreloadBatch>;

    /// Readings whose day falls inside `range`, optionally for one sensor.
    async fn filter_by_range(
        &self,
        range: &DateRange,
        sensor_id: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<SensorReading>>;

    /// Current value and averages. Without a range the period is today.
    async fn stats(&self, range: Option<&DateRange>) -> anyhow::Result<SummaryStats>;
}
