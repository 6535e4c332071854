// Rendering surface and status indicator collaborators
use crate::domain::events::{ConnectivityEvent, ProjectionTag};
use crate::domain::mode::ViewMode;
use crate::domain::telemetry::{SummaryStats, TimePoint};

/// Charting backend the dashboard draws into. One named series per sensor.
pub trait RenderSurface: Send + Sync {
    /// Replace everything the series shows with `points`, in order.
    fn replace_series(&self, series: &str, points: &[TimePoint], tag: ProjectionTag);

    /// Append one point and keep only the last `keep_last`.
    /// Returns false when the surface cannot extend incrementally.
    fn extend_series(
        &self,
        _series: &str,
        _point: &TimePoint,
        _keep_last: usize,
        _tag: ProjectionTag,
    ) -> bool {
        false
    }

    fn set_series_visible(&self, series: &str, visible: bool);

    /// Latest-value card for a sensor.
    fn show_latest(&self, _series: &str, _point: &TimePoint) {}

    fn show_summary(&self, _summary: &SummaryStats) {}

    /// Remove every series.
    fn clear(&self);
}

/// Status line next to the chart.
pub trait StatusIndicator: Send + Sync {
    fn set_connectivity(&self, event: &ConnectivityEvent);

    fn show_mode(&self, mode: ViewMode);

    /// Operator-visible failure, e.g. the initial load did not complete.
    fn report_error(&self, message: &str);
}
