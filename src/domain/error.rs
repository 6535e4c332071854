// Error kinds surfaced by the dashboard core
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Network, HTTP or payload error on a bulk fetch.
    #[error("fetch failed: {0:#}")]
    FetchFailure(anyhow::Error),

    #[error("invalid point: {0}")]
    InvalidPoint(String),

    /// Window size that is not a positive integer.
    #[error("invalid window size {0:?}")]
    InvalidConfig(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),
}
