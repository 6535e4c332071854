// Stream ingestor - Applies push-channel events to the session
use crate::application::session::DashboardSession;
use crate::domain::error::DashboardError;
use crate::domain::events::{ConnectivityEvent, ReadingEvent};
use crate::domain::telemetry::{parse_timestamp, Deployment, TimePoint};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct StreamIngestor {
    deployment: Deployment,
    implicit_sensor: String,
}

impl StreamIngestor {
    pub fn new(deployment: Deployment, implicit_sensor: impl Into<String>) -> Self {
        Self {
            deployment,
            implicit_sensor: implicit_sensor.into(),
        }
    }

    /// Append a pushed reading. Rendered immediately in live mode, only
    /// buffered in historical mode.
    ///
    /// Invalid readings are rejected without touching the session.
    pub fn on_reading(
        &self,
        session: &mut DashboardSession,
        event: ReadingEvent,
        received_at: DateTime<Utc>,
    ) -> Result<(), DashboardError> {
        let sensor_id = self.resolve_sensor(event.sensor_id.as_deref())?;
        let timestamp = match event.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => received_at,
        };
        let point = TimePoint::from_reading(timestamp, event.value);

        session.append(&sensor_id, point)?;
        tracing::debug!(
            "Reading {:?} for {} ({} mode)",
            point.value,
            sensor_id,
            session.mode().mode().label()
        );
        Ok(())
    }

    /// Device online/offline notices go straight to the status indicator.
    pub fn on_connectivity(&self, session: &DashboardSession, event: &ConnectivityEvent) {
        tracing::info!(
            "Device {} is {:?}",
            event.device_id.as_deref().unwrap_or("<default>"),
            event.status
        );
        session.status().set_connectivity(event);
    }

    fn resolve_sensor(&self, sensor_id: Option<&str>) -> Result<String, DashboardError> {
        match self.deployment {
            Deployment::Single => Ok(self.implicit_sensor.clone()),
            Deployment::Multi => sensor_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .ok_or_else(|| DashboardError::InvalidPoint("reading without sensor id".to_string())),
        }
    }
}
