// Library surface for the binary and for headless/integration tests.
// Rendering lives in the binary; everything here is terminal independent.
pub mod app;
pub mod app_dirs;
pub mod capture;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod query;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod shot;
pub mod stats;

pub use error::{ConfigError, HistoryError, InputError};
pub use shot::{DistanceLabel, SessionId, Shot, Timestamp, VolleySize};
pub use stats::{summarize, Stats};
