// In-memory collaborators for unit tests
use crate::application::bulk_fetch::BulkFetch;
use crate::application::render_surface::{RenderSurface, StatusIndicator};
use crate::application::session::DashboardSession;
use crate::domain::events::{ConnectivityEvent, ProjectionTag};
use crate::domain::mode::{ViewMode, WindowSize};
use crate::domain::telemetry::{
    DateRange, Deployment, PreloadBatch, SensorReading, SummaryStats, TimePoint,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn reading(sensor: Option<&str>, minute: i64, value: f64) -> SensorReading {
    SensorReading::new(sensor.map(str::to_string), TimePoint::new(at(minute), value))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Replace { series: String, len: usize, tag: ProjectionTag },
    Extend { series: String, keep_last: usize },
    Visible { series: String, visible: bool },
    Latest { series: String, value: Option<f64> },
    Summary(SummaryStats),
    Clear,
}

/// Records every call and keeps a model of what each series shows.
#[derive(Default)]
pub struct RecordingSurface {
    supports_extend: bool,
    calls: Mutex<Vec<SurfaceCall>>,
    shown: Mutex<HashMap<String, Vec<TimePoint>>>,
}

impl RecordingSurface {
    pub fn with_extend() -> Self {
        Self {
            supports_extend: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of replace/extend calls so far.
    pub fn render_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Replace { .. } | SurfaceCall::Extend { .. }))
            .count()
    }

    pub fn shown(&self, series: &str) -> Vec<f64> {
        self.shown
            .lock()
            .unwrap()
            .get(series)
            .map(|points| points.iter().filter_map(|p| p.value).collect())
            .unwrap_or_default()
    }

    pub fn series_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.shown.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RenderSurface for RecordingSurface {
    fn replace_series(&self, series: &str, points: &[TimePoint], tag: ProjectionTag) {
        self.shown
            .lock()
            .unwrap()
            .insert(series.to_string(), points.to_vec());
        self.record(SurfaceCall::Replace {
            series: series.to_string(),
            len: points.len(),
            tag,
        });
    }

    fn extend_series(
        &self,
        series: &str,
        point: &TimePoint,
        keep_last: usize,
        _tag: ProjectionTag,
    ) -> bool {
        if !self.supports_extend {
            return false;
        }
        let mut shown = self.shown.lock().unwrap();
        let points = shown.entry(series.to_string()).or_default();
        points.push(*point);
        let excess = points.len().saturating_sub(keep_last);
        points.drain(..excess);
        drop(shown);
        self.record(SurfaceCall::Extend {
            series: series.to_string(),
            keep_last,
        });
        true
    }

    fn set_series_visible(&self, series: &str, visible: bool) {
        self.record(SurfaceCall::Visible {
            series: series.to_string(),
            visible,
        });
    }

    fn show_latest(&self, series: &str, point: &TimePoint) {
        self.record(SurfaceCall::Latest {
            series: series.to_string(),
            value: point.value,
        });
    }

    fn show_summary(&self, summary: &SummaryStats) {
        self.record(SurfaceCall::Summary(summary.clone()));
    }

    fn clear(&self) {
        self.shown.lock().unwrap().clear();
        self.record(SurfaceCall::Clear);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusCall {
    Connectivity(ConnectivityEvent),
    Mode(ViewMode),
    Error(String),
}

#[derive(Default)]
pub struct RecordingStatus {
    calls: Mutex<Vec<StatusCall>>,
}

impl RecordingStatus {
    pub fn calls(&self) -> Vec<StatusCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StatusCall::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl StatusIndicator for RecordingStatus {
    fn set_connectivity(&self, event: &ConnectivityEvent) {
        self.calls
            .lock()
            .unwrap()
            .push(StatusCall::Connectivity(event.clone()));
    }

    fn show_mode(&self, mode: ViewMode) {
        self.calls.lock().unwrap().push(StatusCall::Mode(mode));
    }

    fn report_error(&self, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(StatusCall::Error(message.to_string()));
    }
}

pub struct Harness {
    pub session: DashboardSession,
    pub surface: Arc<RecordingSurface>,
    pub status: Arc<RecordingStatus>,
}

pub fn harness(deployment: Deployment, window: usize) -> Harness {
    harness_with(deployment, window, RecordingSurface::default())
}

pub fn harness_with(deployment: Deployment, window: usize, surface: RecordingSurface) -> Harness {
    let surface = Arc::new(surface);
    let status = Arc::new(RecordingStatus::default());
    let session = DashboardSession::new(
        deployment,
        WindowSize::new(window).unwrap(),
        surface.clone(),
        status.clone(),
    );
    Harness {
        session,
        surface,
        status,
    }
}

/// Bulk fetcher serving canned data. `None` results fail.
#[derive(Default)]
pub struct StubFetch {
    pub preload: Option<Vec<SensorReading>>,
    pub summary: Option<SummaryStats>,
    pub filtered: Option<Vec<SensorReading>>,
    pub stats: Option<SummaryStats>,
    /// When set, filter requests wait for a notification before answering.
    pub filter_gate: Option<Arc<Notify>>,
    pub filter_calls: Mutex<Vec<(DateRange, Option<String>, usize)>>,
}

#[async_trait]
impl BulkFetch for StubFetch {
    async fn preload(&self, limit: usize) -> anyhow::Result<PreloadBatch> {
        let readings = self
            .preload
            .clone()
            .ok_or_else(|| anyhow::anyhow!("backend unavailable"))?;
        let skip = readings.len().saturating_sub(limit);
        Ok(PreloadBatch {
            readings: readings.into_iter().skip(skip).collect(),
            summary: self.summary.clone(),
        })
    }

    async fn filter_by_range(
        &self,
        range: &DateRange,
        sensor_id: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<SensorReading>> {
        self.filter_calls
            .lock()
            .unwrap()
            .push((*range, sensor_id.map(str::to_string), limit));
        if let Some(gate) = &self.filter_gate {
            gate.notified().await;
        }
        let readings = self
            .filtered
            .clone()
            .ok_or_else(|| anyhow::anyhow!("connection reset"))?;
        Ok(readings
            .into_iter()
            .filter(|r| sensor_id.is_none() || r.sensor_id.as_deref() == sensor_id)
            .take(limit)
            .collect())
    }

    async fn stats(&self, _range: Option<&DateRange>) -> anyhow::Result<SummaryStats> {
        self.stats
            .clone()
            .ok_or_else(|| anyhow::anyhow!("stats unavailable"))
    }
}
