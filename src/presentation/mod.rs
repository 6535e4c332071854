// Presentation layer - Console rendering of the dashboard
pub mod console_surface;
pub mod format;
