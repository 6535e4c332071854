// RenderSync - Projects buffers onto the rendering surface
use crate::application::render_surface::RenderSurface;
use crate::domain::events::ProjectionTag;
use crate::domain::mode::ModeController;
use crate::domain::sensor_registry::SensorRegistry;
use crate::domain::series_buffer::SeriesBuffer;
use std::collections::HashMap;
use std::sync::Arc;

/// What the surface currently shows for a series, as of our last projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shown {
    Tail(usize),
    Full,
}

pub struct RenderSync {
    surface: Arc<dyn RenderSurface>,
    next_tag: u64,
    shown: HashMap<String, Shown>,
}

impl RenderSync {
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            surface,
            next_tag: 1,
            shown: HashMap::new(),
        }
    }

    /// Replace what the surface shows for `sensor_id` with its visible slice:
    /// the last W points in live mode, the whole buffer in historical mode.
    ///
    /// Hidden sensors are skipped. Returns the tag of the projection issued.
    pub fn project(
        &mut self,
        sensor_id: &str,
        registry: &SensorRegistry,
        mode: &ModeController,
    ) -> Option<ProjectionTag> {
        if !registry.is_rendered(sensor_id) {
            self.shown.remove(sensor_id);
            return None;
        }

        let empty = SeriesBuffer::new();
        let buffer = registry.get(sensor_id).map_or(&empty, |e| &e.buffer);
        let (slice, shown) = if mode.is_live() {
            let w = mode.window().get();
            (buffer.tail_window(w), Shown::Tail(w))
        } else {
            (buffer.points(), Shown::Full)
        };

        let tag = self.tag();
        tracing::debug!(
            "Projecting {} ({} of {} points, {:?})",
            sensor_id,
            slice.len(),
            buffer.len(),
            tag
        );
        self.surface.replace_series(sensor_id, slice, tag);
        self.shown.insert(sensor_id.to_string(), shown);
        Some(tag)
    }

    /// Render a point just appended to `sensor_id` while live.
    ///
    /// Extends the series in place when the surface already shows the current
    /// window, otherwise falls back to a full projection.
    pub fn project_append(
        &mut self,
        sensor_id: &str,
        registry: &SensorRegistry,
        mode: &ModeController,
    ) -> Option<ProjectionTag> {
        if !mode.is_live() {
            self.invalidate(sensor_id);
            return None;
        }
        if !registry.is_rendered(sensor_id) {
            self.shown.remove(sensor_id);
            return None;
        }

        let w = mode.window().get();
        if self.shown.get(sensor_id) == Some(&Shown::Tail(w)) {
            if let Some(point) = registry.get(sensor_id).and_then(|e| e.buffer.last()) {
                let tag = self.tag();
                if self.surface.extend_series(sensor_id, point, w, tag) {
                    return Some(tag);
                }
            }
        }
        self.project(sensor_id, registry, mode)
    }

    /// Forget what the surface shows for a sensor whose buffer changed
    /// without a projection.
    pub fn invalidate(&mut self, sensor_id: &str) {
        self.shown.remove(sensor_id);
    }

    /// Clear the surface, e.g. before the registry is rebuilt.
    pub fn clear(&mut self) {
        self.shown.clear();
        self.surface.clear();
    }

    fn tag(&mut self) -> ProjectionTag {
        let tag = ProjectionTag(self.next_tag);
        self.next_tag += 1;
        tag
    }
}
