// Live / Historical view-mode automaton
use crate::domain::error::DashboardError;
use crate::domain::events::InteractionEvent;
use crate::domain::telemetry::DateRange;

pub const DEFAULT_WINDOW_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Follow the newest W points of each buffer.
    Live,
    /// Show the whole buffer and ignore incoming readings until resumed.
    Historical,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Live => "Live",
            ViewMode::Historical => "Historical",
        }
    }
}

/// Count of most-recent points shown in live mode. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    pub fn new(n: usize) -> Option<Self> {
        (n > 0).then_some(Self(n))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_SIZE)
    }
}

impl std::str::FromStr for WindowSize {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<usize>()
            .ok()
            .and_then(WindowSize::new)
            .ok_or_else(|| DashboardError::InvalidConfig(raw.to_string()))
    }
}

/// Every change of state bumps the epoch, as does each new historical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModeEpoch(u64);

#[derive(Debug, Clone)]
pub struct ModeController {
    mode: ViewMode,
    window: WindowSize,
    epoch: ModeEpoch,
    range: Option<DateRange>,
}

impl ModeController {
    pub fn new(window: WindowSize) -> Self {
        Self {
            mode: ViewMode::Live,
            window,
            epoch: ModeEpoch(0),
            range: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == ViewMode::Live
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn epoch(&self) -> ModeEpoch {
        self.epoch
    }

    /// Range of the active historical filter, if the view came from one.
    pub fn historical_range(&self) -> Option<DateRange> {
        self.range
    }

    /// Leave live mode when the operator pans, zooms or disables autorange.
    ///
    /// Echoes of our own projections never count as operator input.
    /// Returns true when the call changed the mode.
    pub fn signal_user_interaction(&mut self, event: &InteractionEvent) -> bool {
        if let Some(tag) = event.echo {
            tracing::trace!("Ignoring relayout echo of projection {:?}", tag);
            return false;
        }
        if !event.changes_range() || self.mode == ViewMode::Historical {
            return false;
        }
        self.enter(ViewMode::Historical);
        self.range = None;
        true
    }

    /// Parse the window control. Invalid input keeps the previous size.
    pub fn set_window_size(&mut self, raw: &str) -> Result<WindowSize, DashboardError> {
        let window = raw.parse::<WindowSize>()?;
        self.window = window;
        Ok(window)
    }

    pub fn go_live(&mut self) {
        if self.mode != ViewMode::Live {
            self.enter(ViewMode::Live);
        }
        self.range = None;
    }

    /// Switch to historical mode for `range`. Loading the data is the
    /// caller's job.
    pub fn go_historical(&mut self, range: DateRange) -> ModeEpoch {
        self.enter(ViewMode::Historical);
        self.range = Some(range);
        self.epoch
    }

    /// Put back the range an earlier historical view was showing. Used when
    /// a later filter never loaded, so the mode itself stays historical.
    pub fn restore_range(&mut self, range: Option<DateRange>) {
        if self.mode == ViewMode::Historical {
            self.range = range;
        }
    }

    fn enter(&mut self, mode: ViewMode) {
        tracing::info!("View mode {} -> {}", self.mode.label(), mode.label());
        self.mode = mode;
        self.epoch = ModeEpoch(self.epoch.0 + 1);
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(WindowSize::default())
    }
}
