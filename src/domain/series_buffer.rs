// Per-sensor ordered buffer of observed points
use crate::domain::error::DashboardError;
use crate::domain::telemetry::TimePoint;

/// Append-only sequence of points, ordered by timestamp ascending.
///
/// Retention is unbounded: live mode only windows the view.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    points: Vec<TimePoint>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point at the tail. Points without a reading are rejected and
    /// the buffer is left unchanged.
    pub fn append(&mut self, point: TimePoint) -> Result<(), DashboardError> {
        if !point.has_reading() {
            return Err(DashboardError::InvalidPoint(format!(
                "no finite value at {}",
                point.timestamp
            )));
        }
        self.points.push(point);
        Ok(())
    }

    /// Discard the current contents and store `points` sorted by timestamp.
    ///
    /// The sort is stable, so points sharing a timestamp keep their
    /// delivery order.
    pub fn replace_all(&mut self, mut points: Vec<TimePoint>) {
        points.sort_by_key(|p| p.timestamp);
        self.points = points;
    }

    /// The last `min(n, len)` points, oldest first.
    pub fn tail_window(&self, n: usize) -> &[TimePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
