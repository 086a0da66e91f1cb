use ratatui::Frame;

use quiver::app::{App, AppState};

use crate::ui::{render_capture, render_dashboard, render_summary};

/// A UI Screen boundary: responsible for rendering one application state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Target with crosshair, live feedback and the volley prompt
pub struct CaptureScreen;

impl Screen for CaptureScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_capture(app, f);
    }
}

/// End-of-session target and statistics
pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_summary(app, f);
    }
}

/// History browser
pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_dashboard(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Capture | AppState::VolleyPrompt => Box::new(CaptureScreen),
        AppState::Summary => Box::new(SummaryScreen),
        AppState::Dashboard => Box::new(DashboardScreen),
    }
}
