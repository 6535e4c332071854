// Sensor id -> buffer and visibility
use crate::domain::error::DashboardError;
use crate::domain::series_buffer::SeriesBuffer;
use crate::domain::telemetry::TimePoint;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SensorEntry {
    pub buffer: SeriesBuffer,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct SensorRegistry {
    entries: BTreeMap<String, SensorEntry>,
    /// False for single-series dashboards, where every sensor is drawn.
    visibility_applies: bool,
}

impl SensorRegistry {
    pub fn new(visibility_applies: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            visibility_applies,
        }
    }

    pub fn get_or_create(&mut self, sensor_id: &str) -> &mut SensorEntry {
        if !self.entries.contains_key(sensor_id) {
            tracing::debug!("Registering sensor {}", sensor_id);
        }
        self.entries.entry(sensor_id.to_string()).or_default()
    }

    /// Append to a sensor's buffer. A sensor is registered only once one of
    /// its points has been accepted.
    pub fn append(&mut self, sensor_id: &str, point: TimePoint) -> Result<(), DashboardError> {
        if let Some(entry) = self.entries.get_mut(sensor_id) {
            return entry.buffer.append(point);
        }
        let mut entry = SensorEntry::default();
        entry.buffer.append(point)?;
        tracing::debug!("Registering sensor {}", sensor_id);
        self.entries.insert(sensor_id.to_string(), entry);
        Ok(())
    }

    pub fn get(&self, sensor_id: &str) -> Option<&SensorEntry> {
        self.entries.get(sensor_id)
    }

    /// Drop every entry. Returns the ids that were visible so the caller can
    /// restore the operator's selection for sensors that come back.
    pub fn reset_all(&mut self) -> Vec<String> {
        let visible = self
            .entries
            .iter()
            .filter(|(_, e)| e.visible)
            .map(|(id, _)| id.clone())
            .collect();
        self.entries.clear();
        visible
    }

    /// Flip visibility and return the new state.
    pub fn toggle_visibility(&mut self, sensor_id: &str) -> bool {
        let entry = self.get_or_create(sensor_id);
        entry.visible = !entry.visible;
        entry.visible
    }

    /// Whether projections for this sensor reach the rendering surface.
    pub fn is_rendered(&self, sensor_id: &str) -> bool {
        !self.visibility_applies || self.entries.get(sensor_id).is_some_and(|e| e.visible)
    }

    pub fn visibility_applies(&self) -> bool {
        self.visibility_applies
    }

    pub fn sensor_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
