// Query coordinator - Bulk loads, historical filters and summary stats
use crate::application::bulk_fetch::BulkFetch;
use crate::application::session::DashboardSession;
use crate::domain::error::DashboardError;
use crate::domain::mode::{ModeEpoch, ViewMode};
use crate::domain::telemetry::{
    DateRange, Deployment, PreloadBatch, SensorReading, SummaryStats, TimePoint,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A historical filter that has switched the view and is waiting for data.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTicket {
    pub range: DateRange,
    pub sensor_id: Option<String>,
    epoch: ModeEpoch,
    /// View to return to if the fetch fails.
    prior_mode: ViewMode,
    prior_range: Option<DateRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Applied,
    /// The operator resumed live mode or issued another filter meanwhile.
    Superseded,
    Failed,
}

#[derive(Clone)]
pub struct QueryCoordinator {
    fetcher: Arc<dyn BulkFetch>,
    deployment: Deployment,
    implicit_sensor: String,
    filter_limit: usize,
}

impl QueryCoordinator {
    pub fn new(
        fetcher: Arc<dyn BulkFetch>,
        deployment: Deployment,
        implicit_sensor: impl Into<String>,
        filter_limit: usize,
    ) -> Self {
        Self {
            fetcher,
            deployment,
            implicit_sensor: implicit_sensor.into(),
            filter_limit,
        }
    }

    /// Seed the session with the most recent `limit` readings.
    pub async fn preload(
        &self,
        session: &mut DashboardSession,
        limit: usize,
    ) -> Result<usize, DashboardError> {
        let outcome = self.fetch_preload(limit).await;
        self.complete_preload(session, outcome)
    }

    pub async fn fetch_preload(&self, limit: usize) -> Result<PreloadBatch, DashboardError> {
        self.fetcher
            .preload(limit)
            .await
            .map_err(DashboardError::FetchFailure)
    }

    /// Apply a preload result. Returns the number of sensors seeded.
    ///
    /// On failure the buffers are left as they are and the operator is told
    /// the dashboard failed to initialize; live readings keep flowing.
    pub fn complete_preload(
        &self,
        session: &mut DashboardSession,
        outcome: Result<PreloadBatch, DashboardError>,
    ) -> Result<usize, DashboardError> {
        let batch = match outcome {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!("Failed to initialize: {}", e);
                session
                    .status()
                    .report_error(&format!("Failed to initialize: {}", e));
                return Err(e);
            }
        };

        if let Some(range) = session.mode().historical_range() {
            tracing::info!(
                "Skipping preload, filter {} .. {} is already shown",
                range.start,
                range.end
            );
            return Ok(0);
        }

        let grouped = self.group_by_sensor(batch.readings);
        let seeded = grouped.len();
        for (sensor_id, mut points) in grouped {
            // Keep live readings that arrived while the preload was in flight.
            let newest = points.iter().map(|p| p.timestamp).max();
            if let Some(entry) = session.registry().get(&sensor_id) {
                points.extend(
                    entry
                        .buffer
                        .points()
                        .iter()
                        .filter(|p| newest.is_none_or(|n| p.timestamp > n))
                        .copied(),
                );
            }
            tracing::debug!("Preloaded {} points for {}", points.len(), sensor_id);
            session.replace_points(&sensor_id, points);
        }

        if let Some(summary) = batch.summary {
            session.surface().show_summary(&summary);
        }
        session.project_all();
        tracing::info!("Preload complete: {} sensors", seeded);
        Ok(seeded)
    }

    /// Switch to historical mode for `range` and load it.
    pub async fn apply_filter(
        &self,
        session: &mut DashboardSession,
        range: DateRange,
        sensor_id: Option<String>,
    ) -> FilterOutcome {
        let ticket = self.begin_filter(session, range, sensor_id);
        let outcome = self.fetch_filter(&ticket).await;
        self.complete_filter(session, &ticket, outcome)
    }

    /// Enter historical mode right away; the data follows in `complete_filter`.
    pub fn begin_filter(
        &self,
        session: &mut DashboardSession,
        range: DateRange,
        sensor_id: Option<String>,
    ) -> FilterTicket {
        let prior_mode = session.mode().mode();
        let prior_range = session.mode().historical_range();
        let epoch = session.go_historical(range);
        tracing::info!(
            "Filtering {} .. {} (sensor {})",
            range.start,
            range.end,
            sensor_id.as_deref().unwrap_or("*")
        );
        FilterTicket {
            range,
            sensor_id,
            epoch,
            prior_mode,
            prior_range,
        }
    }

    pub async fn fetch_filter(
        &self,
        ticket: &FilterTicket,
    ) -> Result<Vec<SensorReading>, DashboardError> {
        let sensor_id = match self.deployment {
            Deployment::Single => None,
            Deployment::Multi => ticket.sensor_id.as_deref(),
        };
        self.fetcher
            .filter_by_range(&ticket.range, sensor_id, self.filter_limit)
            .await
            .map_err(DashboardError::FetchFailure)
    }

    /// Replace the buffers with a filter result and draw all of it.
    ///
    /// Results for a filter the operator has since abandoned are dropped
    /// without touching buffers or the surface. A failed fetch restores the
    /// view the filter was issued from.
    pub fn complete_filter(
        &self,
        session: &mut DashboardSession,
        ticket: &FilterTicket,
        outcome: Result<Vec<SensorReading>, DashboardError>,
    ) -> FilterOutcome {
        let mode = session.mode();
        if mode.mode() != ViewMode::Historical || mode.epoch() != ticket.epoch {
            tracing::debug!(
                "Dropping result of superseded filter {} .. {}",
                ticket.range.start,
                ticket.range.end
            );
            return FilterOutcome::Superseded;
        }

        let readings = match outcome {
            Ok(readings) => readings,
            Err(e) => {
                tracing::error!("Filter failed: {}", e);
                session.status().report_error(&format!("Filter failed: {}", e));
                session.restore_view(ticket.prior_mode, ticket.prior_range);
                return FilterOutcome::Failed;
            }
        };

        let mut grouped = self.group_by_sensor(readings);
        match self.deployment {
            Deployment::Single => {
                let points = grouped.remove(&self.implicit_sensor).unwrap_or_default();
                session.replace_points(&self.implicit_sensor, points);
            }
            Deployment::Multi => {
                let previously_visible = session.reset_all();
                for (sensor_id, points) in grouped {
                    session.replace_points(&sensor_id, points);
                }
                let requested = ticket.sensor_id.iter().cloned();
                for sensor_id in previously_visible.into_iter().chain(requested) {
                    if session.registry().get(&sensor_id).is_some() {
                        session.set_visible(&sensor_id);
                    }
                }
            }
        }
        session.project_all();
        FilterOutcome::Applied
    }

    /// Fetch headline numbers. Independent of the series data.
    pub async fn refresh_stats(&self, session: &DashboardSession, range: Option<DateRange>) {
        let outcome = self.fetch_stats(range).await;
        self.complete_stats(session, outcome);
    }

    pub async fn fetch_stats(
        &self,
        range: Option<DateRange>,
    ) -> Result<SummaryStats, DashboardError> {
        self.fetcher
            .stats(range.as_ref())
            .await
            .map_err(DashboardError::FetchFailure)
    }

    pub fn complete_stats(
        &self,
        session: &DashboardSession,
        outcome: Result<SummaryStats, DashboardError>,
    ) {
        match outcome {
            Ok(summary) => session.surface().show_summary(&summary),
            Err(e) => tracing::warn!("Summary unavailable: {}", e),
        }
    }

    fn group_by_sensor(&self, readings: Vec<SensorReading>) -> BTreeMap<String, Vec<TimePoint>> {
        let mut grouped: BTreeMap<String, Vec<TimePoint>> = BTreeMap::new();
        for reading in readings {
            let sensor_id = match self.deployment {
                Deployment::Single => self.implicit_sensor.clone(),
                Deployment::Multi => match reading.sensor_id {
                    Some(id) if !id.trim().is_empty() => id,
                    _ => {
                        tracing::warn!("Skipping bulk reading without sensor id");
                        continue;
                    }
                },
            };
            grouped.entry(sensor_id).or_default().push(reading.point);
        }
        grouped
    }
}
