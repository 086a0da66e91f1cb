use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::error;

use crate::capture::{CaptureArea, Crosshair};
use crate::dashboard::{Dashboard, DashboardEffect, FilterChangedEvent};
use crate::history::HistoryStore;
use crate::session::{CaptureEffect, RecorderState, RejectReason, SessionConfig, SessionRecorder};
use crate::shot::{Shot, Timestamp};
use crate::stats::Stats;

const FEEDBACK_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Capture,
    VolleyPrompt,
    Summary,
    Dashboard,
}

/// Outcome of writing the finished session to the history
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved { path: String, arrows: usize },
    Failed(String),
}

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Terminal application state, independent of any backend
pub struct App {
    pub state: AppState,
    pub crosshair: Crosshair,
    pub area: CaptureArea,
    pub recorder: Option<SessionRecorder>,
    pub store: HistoryStore,
    pub dashboard: Dashboard,
    pub dashboard_view: DashboardEffect,
    pub feedback: Vec<String>,
    /// Shots of the session just captured, kept for the summary target
    pub session_shots: Vec<Shot>,
    pub session_stats: Option<Stats>,
    pub save_status: Option<SaveStatus>,
}

impl App {
    /// Start a capture run under a session id not yet in the history
    pub fn capture(mut config: SessionConfig, store: HistoryStore) -> Self {
        config.started_at = store.free_session_start(config.started_at);
        let mut app = Self::with_store(store, AppState::Capture);
        app.recorder = Some(SessionRecorder::new(config));
        app
    }

    /// Browse the history only
    pub fn dashboard(store: HistoryStore) -> Self {
        Self::with_store(store, AppState::Dashboard)
    }

    fn with_store(store: HistoryStore, state: AppState) -> Self {
        let dashboard = Dashboard::new(store.shots());
        let dashboard_view = dashboard.render(store.shots(), Timestamp::now());
        let area = CaptureArea::default();
        Self {
            state,
            crosshair: Crosshair::new(area),
            area,
            recorder: None,
            store,
            dashboard,
            dashboard_view,
            feedback: Vec::new(),
            session_shots: Vec::new(),
            session_stats: None,
            save_status: None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.finish_session();
            return Control::Quit;
        }

        match self.state {
            AppState::Capture => self.on_capture_key(key),
            AppState::VolleyPrompt => self.on_prompt_key(key),
            AppState::Summary => match key.code {
                KeyCode::Char('h') | KeyCode::Enter => {
                    self.state = AppState::Dashboard;
                    Control::Continue
                }
                KeyCode::Esc | KeyCode::Char('q') => Control::Quit,
                _ => Control::Continue,
            },
            AppState::Dashboard => self.on_dashboard_key(key),
        }
    }

    fn on_capture_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Left => self.crosshair.nudge(-1.0, 0.0),
            KeyCode::Right => self.crosshair.nudge(1.0, 0.0),
            KeyCode::Up => self.crosshair.nudge(0.0, 1.0),
            KeyCode::Down => self.crosshair.nudge(0.0, -1.0),
            KeyCode::Tab => self.crosshair.toggle_step(),
            KeyCode::Char('0') => self.crosshair.recenter(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let (x, y) = self.crosshair.position();
                self.fire(x, y);
            }
            KeyCode::Char('c') => {
                let effects: Vec<CaptureEffect> = self
                    .recorder
                    .as_mut()
                    .and_then(|rec| rec.close_volley())
                    .into_iter()
                    .collect();
                self.apply_capture_effects(effects);
            }
            KeyCode::Char('f') => self.finish_session(),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.finish_session();
                return Control::Quit;
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_prompt_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let effects: Vec<CaptureEffect> = self
                    .recorder
                    .as_mut()
                    .and_then(|rec| rec.continue_session())
                    .into_iter()
                    .collect();
                self.apply_capture_effects(effects);
            }
            KeyCode::Char('n') | KeyCode::Char('f') => self.finish_session(),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.finish_session();
                return Control::Quit;
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) -> Control {
        let shots = self.store.shots();
        let event = match key.code {
            KeyCode::Char('d') => self.dashboard.cycle_distance(shots, true),
            KeyCode::Char('D') => self.dashboard.cycle_distance(shots, false),
            KeyCode::Tab | KeyCode::Char('t') => Some(self.dashboard.toggle_kind()),
            KeyCode::Right | KeyCode::Down => self.dashboard.cycle_selector(shots, true),
            KeyCode::Left | KeyCode::Up => self.dashboard.cycle_selector(shots, false),
            KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
            _ => None,
        };
        if let Some(event) = event {
            self.apply_filter(event);
        }
        Control::Continue
    }

    /// Deliver one impact in target coordinates
    pub fn fire(&mut self, x: f64, y: f64) {
        if self.area.accept(x, y).is_err() {
            self.push_feedback(format!("({x:.2}, {y:.2}) is outside the capture area"));
            return;
        }
        let effects = match self.recorder.as_mut() {
            Some(rec) => rec.record_impact(x, y),
            None => return,
        };
        self.apply_capture_effects(effects);
    }

    pub fn apply_filter(&mut self, event: FilterChangedEvent) {
        let effects = self
            .dashboard
            .apply(event, self.store.shots(), Timestamp::now());
        for effect in effects {
            if matches!(effect, DashboardEffect::Redraw(_) | DashboardEffect::NoData) {
                self.dashboard_view = effect;
            }
        }
    }

    fn apply_capture_effects(&mut self, effects: Vec<CaptureEffect>) {
        for effect in effects {
            match effect {
                CaptureEffect::ShotScored {
                    x,
                    y,
                    score,
                    arrow_index,
                    ..
                } => {
                    self.push_feedback(format!(
                        "Arrow {arrow_index}: ({x:.2}, {y:.2}) → {score} points"
                    ));
                }
                CaptureEffect::VolleyClosed { volley_index, .. } => {
                    self.push_feedback(format!("Volley {volley_index} complete."));
                    self.state = AppState::VolleyPrompt;
                }
                CaptureEffect::VolleyStarted { volley_index } => {
                    self.push_feedback(format!("Volley {volley_index}: take aim"));
                    self.crosshair.recenter();
                    self.state = AppState::Capture;
                }
                CaptureEffect::SessionFinished(stats) => {
                    self.session_stats = Some(stats);
                    self.state = AppState::Summary;
                }
                CaptureEffect::Rejected(RejectReason::NoOpenVolley) => {
                    self.push_feedback("No open volley; press y to start the next one".into());
                }
                CaptureEffect::Rejected(RejectReason::OutsideCaptureArea) => {
                    self.push_feedback("Impact outside the capture area".into());
                }
            }
        }
    }

    /// End the capture run and persist it; no-op without an active recorder
    pub fn finish_session(&mut self) {
        let Some(mut recorder) = self.recorder.take() else {
            return;
        };
        let effects = recorder.finish();
        let distance = recorder.config.distance.clone();
        self.session_shots = recorder.into_shots();
        self.apply_capture_effects(effects);

        self.save_status = Some(match self.store.append_session(&self.session_shots) {
            Ok(()) => SaveStatus::Saved {
                path: self.store.location().display().to_string(),
                arrows: self.session_shots.len(),
            },
            Err(e) => {
                error!("failed to save session: {e}");
                SaveStatus::Failed(e.to_string())
            }
        });

        self.dashboard = Dashboard::new(self.store.shots());
        self.apply_filter(FilterChangedEvent::Distance(distance));
    }

    pub fn current_volley(&self) -> Option<u32> {
        match self.recorder.as_ref()?.state() {
            RecorderState::AwaitingShot { volley_index }
            | RecorderState::VolleyComplete { volley_index } => Some(volley_index),
            RecorderState::SessionComplete => None,
        }
    }

    /// Shots to plot on the capture target: closed volleys plus the open one
    pub fn live_shots(&self) -> Vec<&Shot> {
        match &self.recorder {
            Some(rec) => rec.shots().iter().chain(rec.open_volley()).collect(),
            None => self.session_shots.iter().collect(),
        }
    }

    fn push_feedback(&mut self, line: String) {
        self.feedback.push(line);
        if self.feedback.len() > FEEDBACK_LINES {
            let excess = self.feedback.len() - FEEDBACK_LINES;
            self.feedback.drain(..excess);
        }
    }
}
