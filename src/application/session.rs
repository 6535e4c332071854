// Dashboard session - Owns all per-client state
use crate::application::render_surface::{RenderSurface, StatusIndicator};
use crate::application::render_sync::RenderSync;
use crate::domain::error::DashboardError;
use crate::domain::events::{InteractionEvent, ProjectionTag};
use crate::domain::mode::{ModeController, ModeEpoch, ViewMode, WindowSize};
use crate::domain::sensor_registry::SensorRegistry;
use crate::domain::telemetry::{DateRange, Deployment, TimePoint};
use std::sync::Arc;

/// One client session: sensors, view mode and what has been drawn.
///
/// Every mutation goes through `&mut self`, and every render re-reads the
/// current mode and window size through `RenderSync::project`.
pub struct DashboardSession {
    registry: SensorRegistry,
    mode: ModeController,
    render: RenderSync,
    surface: Arc<dyn RenderSurface>,
    status: Arc<dyn StatusIndicator>,
}

impl DashboardSession {
    pub fn new(
        deployment: Deployment,
        window: WindowSize,
        surface: Arc<dyn RenderSurface>,
        status: Arc<dyn StatusIndicator>,
    ) -> Self {
        let mode = ModeController::new(window);
        status.show_mode(mode.mode());
        Self {
            registry: SensorRegistry::new(deployment.visibility_applies()),
            mode,
            render: RenderSync::new(surface.clone()),
            surface,
            status,
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    pub fn status(&self) -> &Arc<dyn StatusIndicator> {
        &self.status
    }

    /// Forward a relayout notification to the mode controller.
    pub fn signal_user_interaction(&mut self, event: &InteractionEvent) {
        if self.mode.signal_user_interaction(event) {
            self.status.show_mode(self.mode.mode());
        }
    }

    /// Apply the window control. Live views are re-projected at the new size;
    /// invalid input keeps the previous size.
    pub fn set_window_size(&mut self, raw: &str) -> WindowSize {
        match self.mode.set_window_size(raw) {
            Ok(window) => {
                tracing::debug!("Window size set to {}", window.get());
                if self.mode.is_live() {
                    self.project_all();
                }
            }
            Err(e) => {
                tracing::warn!("{}; keeping {}", e, self.mode.window().get());
            }
        }
        self.mode.window()
    }

    /// Resume live mode and redraw every sensor's trailing window.
    pub fn go_live(&mut self, window: Option<&str>) {
        if let Some(raw) = window {
            if let Err(e) = self.mode.set_window_size(raw) {
                tracing::warn!("{}; keeping {}", e, self.mode.window().get());
            }
        }
        self.mode.go_live();
        self.status.show_mode(ViewMode::Live);
        self.project_all();
    }

    pub fn go_historical(&mut self, range: DateRange) -> ModeEpoch {
        let epoch = self.mode.go_historical(range);
        self.status.show_mode(ViewMode::Historical);
        epoch
    }

    /// Return to the view a filter was issued from, after that filter failed.
    pub(crate) fn restore_view(&mut self, mode: ViewMode, range: Option<DateRange>) {
        match mode {
            ViewMode::Live => self.go_live(None),
            ViewMode::Historical => self.mode.restore_range(range),
        }
    }

    /// Show or hide a sensor's chart. Returns the new visibility.
    pub fn toggle_visibility(&mut self, sensor_id: &str) -> bool {
        let visible = self.registry.toggle_visibility(sensor_id);
        self.surface.set_series_visible(sensor_id, visible);
        if visible {
            self.project(sensor_id);
        } else {
            self.render.invalidate(sensor_id);
        }
        visible
    }

    pub(crate) fn set_visible(&mut self, sensor_id: &str) {
        if self.registry.visibility_applies() && !self.registry.is_rendered(sensor_id) {
            self.toggle_visibility(sensor_id);
        }
    }

    pub fn project(&mut self, sensor_id: &str) -> Option<ProjectionTag> {
        self.render.project(sensor_id, &self.registry, &self.mode)
    }

    pub fn project_all(&mut self) {
        for sensor_id in self.registry.sensor_ids() {
            self.project(&sensor_id);
        }
    }

    /// Append a live reading and render it if the view is live.
    pub(crate) fn append(&mut self, sensor_id: &str, point: TimePoint) -> Result<(), DashboardError> {
        self.registry.append(sensor_id, point)?;
        self.surface.show_latest(sensor_id, &point);
        self.render.project_append(sensor_id, &self.registry, &self.mode);
        Ok(())
    }

    /// Swap a sensor's buffer contents in one step. Does not render.
    pub(crate) fn replace_points(&mut self, sensor_id: &str, points: Vec<TimePoint>) {
        let entry = self.registry.get_or_create(sensor_id);
        entry.buffer.replace_all(points);
        if let Some(last) = entry.buffer.last().copied() {
            self.surface.show_latest(sensor_id, &last);
        }
        self.render.invalidate(sensor_id);
    }

    /// Drop every sensor and clear the surface. Returns the ids that were
    /// visible before the reset.
    pub(crate) fn reset_all(&mut self) -> Vec<String> {
        let visible = self.registry.reset_all();
        self.render.clear();
        visible
    }
}
