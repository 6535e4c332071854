// Log-backed rendering surface and status line
use crate::application::render_surface::{RenderSurface, StatusIndicator};
use crate::domain::events::{Connectivity, ConnectivityEvent, ProjectionTag};
use crate::domain::mode::ViewMode;
use crate::domain::telemetry::{SummaryStats, TimePoint};
use crate::presentation::format::{fmt_count, fmt_temperature, fmt_timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct SeriesView {
    points: Vec<TimePoint>,
    hidden: bool,
}

/// Renders the chart as log lines and keeps what each series currently shows.
#[derive(Debug)]
pub struct ConsoleSurface {
    fraction_digits: usize,
    series: Mutex<HashMap<String, SeriesView>>,
}

impl ConsoleSurface {
    pub fn new(fraction_digits: usize) -> Self {
        Self {
            fraction_digits,
            series: Mutex::new(HashMap::new()),
        }
    }

    /// Values currently drawn for `series`, oldest first. Empty when hidden.
    pub fn shown(&self, series: &str) -> Vec<Option<f64>> {
        self.with_series(|all| {
            all.get(series)
                .filter(|view| !view.hidden)
                .map(|view| view.points.iter().map(|p| p.value).collect())
                .unwrap_or_default()
        })
    }

    fn with_series<T>(&self, f: impl FnOnce(&mut HashMap<String, SeriesView>) -> T) -> T {
        match self.series.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn mode_line(mode: ViewMode) -> &'static str {
        match mode {
            ViewMode::Live => "Mode: Live",
            ViewMode::Historical => "Mode: Historical",
        }
    }
}

impl RenderSurface for ConsoleSurface {
    fn replace_series(&self, series: &str, points: &[TimePoint], tag: ProjectionTag) {
        let hidden = self.with_series(|all| {
            let view = all.entry(series.to_string()).or_default();
            view.points = points.to_vec();
            view.hidden
        });
        if hidden {
            return;
        }
        let (first, last) = (points.first(), points.last());
        tracing::info!(
            "[{}] {} points {} .. {} (projection {})",
            series,
            points.len(),
            fmt_timestamp(first.map(|p| p.timestamp)),
            fmt_timestamp(last.map(|p| p.timestamp)),
            tag.0
        );
    }

    fn extend_series(
        &self,
        series: &str,
        point: &TimePoint,
        keep_last: usize,
        tag: ProjectionTag,
    ) -> bool {
        self.with_series(|all| {
            let view = all.entry(series.to_string()).or_default();
            view.points.push(*point);
            let excess = view.points.len().saturating_sub(keep_last);
            view.points.drain(..excess);
        });
        tracing::debug!(
            "[{}] + {} at {} (projection {})",
            series,
            fmt_temperature(point.value, self.fraction_digits),
            fmt_timestamp(Some(point.timestamp)),
            tag.0
        );
        true
    }

    fn set_series_visible(&self, series: &str, visible: bool) {
        self.with_series(|all| all.entry(series.to_string()).or_default().hidden = !visible);
        tracing::info!("[{}] {}", series, if visible { "shown" } else { "hidden" });
    }

    fn show_latest(&self, series: &str, point: &TimePoint) {
        tracing::info!(
            "[{}] latest {} at {}",
            series,
            fmt_temperature(point.value, self.fraction_digits),
            fmt_timestamp(Some(point.timestamp))
        );
    }

    fn show_summary(&self, summary: &SummaryStats) {
        let current = summary.current.as_ref();
        tracing::info!(
            "Current {} at {} | today avg {} ({} readings) | period avg {} ({} readings)",
            fmt_temperature(current.and_then(|p| p.value), self.fraction_digits),
            fmt_timestamp(current.map(|p| p.timestamp)),
            fmt_temperature(summary.daily_avg, self.fraction_digits),
            fmt_count(summary.daily_count),
            fmt_temperature(summary.period_avg, self.fraction_digits),
            fmt_count(summary.period_count)
        );
    }

    fn clear(&self) {
        self.with_series(|all| all.clear());
        tracing::info!("Chart cleared");
    }
}

impl StatusIndicator for ConsoleSurface {
    fn set_connectivity(&self, event: &ConnectivityEvent) {
        let device = event.device_id.as_deref().unwrap_or("device");
        match event.status {
            Connectivity::Online => tracing::info!("{} online", device),
            Connectivity::Offline => tracing::warn!("{} offline", device),
        }
    }

    fn show_mode(&self, mode: ViewMode) {
        tracing::info!("{}", Self::mode_line(mode));
    }

    fn report_error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
