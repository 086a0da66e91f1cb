use tracing::{debug, info};

use crate::shot::{DistanceLabel, SessionId, Shot, Timestamp, VolleySize};
use crate::stats::{summarize, Stats};

/// Settings fixed for the whole capture run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub distance: DistanceLabel,
    pub volley_size: VolleySize,
    pub started_at: Timestamp,
}

impl SessionConfig {
    pub fn new(distance: DistanceLabel, volley_size: VolleySize) -> Self {
        Self {
            distance,
            volley_size,
            started_at: Timestamp::now(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.started_at.session_id()
    }
}

/// Where the capture run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Accepting arrows for the open volley
    AwaitingShot { volley_index: u32 },
    /// The volley just closed; the operator decides whether to go on
    VolleyComplete { volley_index: u32 },
    SessionComplete,
}

/// Messages delivered by the input collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureEvent {
    Impact { x: f64, y: f64 },
    /// Close the open volley even if it is short
    CloseVolley,
    /// Start the next volley after one has closed
    Continue,
    /// End the run, closing any open volley first
    Finish,
}

/// Why an impact was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    OutsideCaptureArea,
    NoOpenVolley,
}

/// Render instructions produced by a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEffect {
    ShotScored {
        x: f64,
        y: f64,
        score: u8,
        volley_index: u32,
        arrow_index: u32,
    },
    VolleyClosed {
        volley_index: u32,
        arrows: usize,
    },
    VolleyStarted {
        volley_index: u32,
    },
    SessionFinished(Stats),
    Rejected(RejectReason),
}

/// One capture run: groups incoming impacts into volleys
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    pub config: SessionConfig,
    session_id: SessionId,
    state: RecorderState,
    volley: Vec<Shot>,
    shots: Vec<Shot>,
    volleys_closed: u32,
}

impl SessionRecorder {
    pub fn new(config: SessionConfig) -> Self {
        info!(
            distance = %config.distance,
            volley_size = config.volley_size.arrows(),
            "starting session {}",
            config.session_id()
        );
        Self {
            session_id: config.session_id(),
            config,
            state: RecorderState::AwaitingShot { volley_index: 1 },
            volley: Vec::new(),
            shots: Vec::new(),
            volleys_closed: 0,
        }
    }

    /// Consume one event, returning the next recorder and what to render
    pub fn step(mut self, event: CaptureEvent) -> (Self, Vec<CaptureEffect>) {
        let effects = self.handle(event);
        (self, effects)
    }

    pub fn handle(&mut self, event: CaptureEvent) -> Vec<CaptureEffect> {
        match event {
            CaptureEvent::Impact { x, y } => self.record_impact(x, y),
            CaptureEvent::CloseVolley => self.close_volley().into_iter().collect(),
            CaptureEvent::Continue => self.continue_session().into_iter().collect(),
            CaptureEvent::Finish => self.finish(),
        }
    }

    /// Score an impact and add it to the open volley
    pub fn record_impact(&mut self, x: f64, y: f64) -> Vec<CaptureEffect> {
        let volley_index = match self.state {
            RecorderState::AwaitingShot { volley_index } => volley_index,
            _ => return vec![CaptureEffect::Rejected(RejectReason::NoOpenVolley)],
        };
        if !x.is_finite() || !y.is_finite() {
            return vec![CaptureEffect::Rejected(RejectReason::OutsideCaptureArea)];
        }

        let arrow_index = self.volley.len() as u32 + 1;
        let shot = Shot::new(
            x,
            y,
            volley_index,
            arrow_index,
            self.session_id.clone(),
            self.config.started_at,
            self.config.distance.clone(),
        );
        debug!(volley_index, arrow_index, score = shot.score(), "arrow at ({x:.2}, {y:.2})");

        let mut effects = vec![CaptureEffect::ShotScored {
            x,
            y,
            score: shot.score(),
            volley_index,
            arrow_index,
        }];
        self.volley.push(shot);

        if self.volley.len() >= self.config.volley_size.arrows() {
            effects.extend(self.close_volley());
        }
        effects
    }

    /// Close the open volley, short or not. An empty buffer stays open.
    pub fn close_volley(&mut self) -> Option<CaptureEffect> {
        let volley_index = match self.state {
            RecorderState::AwaitingShot { volley_index } if !self.volley.is_empty() => volley_index,
            _ => return None,
        };

        let arrows = self.volley.len();
        self.shots.append(&mut self.volley);
        self.volleys_closed += 1;
        self.state = RecorderState::VolleyComplete { volley_index };
        info!(volley_index, arrows, "volley complete");

        Some(CaptureEffect::VolleyClosed {
            volley_index,
            arrows,
        })
    }

    /// Open the next volley after the previous one closed
    pub fn continue_session(&mut self) -> Option<CaptureEffect> {
        match self.state {
            RecorderState::VolleyComplete { volley_index } => {
                let next = volley_index + 1;
                self.state = RecorderState::AwaitingShot { volley_index: next };
                Some(CaptureEffect::VolleyStarted { volley_index: next })
            }
            _ => None,
        }
    }

    /// Terminate the run. Calling it again yields nothing.
    pub fn finish(&mut self) -> Vec<CaptureEffect> {
        if self.is_complete() {
            return Vec::new();
        }

        let mut effects: Vec<CaptureEffect> = self.close_volley().into_iter().collect();
        self.state = RecorderState::SessionComplete;

        let stats = self.summary();
        info!(
            arrows = stats.count,
            total = stats.total_score,
            "session {} complete",
            self.session_id
        );
        effects.push(CaptureEffect::SessionFinished(stats));
        effects
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == RecorderState::SessionComplete
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Arrows of the volley still open
    pub fn open_volley(&self) -> &[Shot] {
        &self.volley
    }

    /// Arrows of every closed volley, in capture order
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn volleys_closed(&self) -> u32 {
        self.volleys_closed
    }

    pub fn summary(&self) -> Stats {
        summarize(&self.shots)
    }

    /// Hand the recorded shots over for persistence
    pub fn into_shots(self) -> Vec<Shot> {
        self.shots
    }
}
