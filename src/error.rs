use std::path::PathBuf;

use thiserror::Error;

use crate::shot::SessionId;

/// Failures while reading or writing the shot history
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to access history at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write history at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed history file: {0}")]
    Csv(#[from] csv::Error),

    #[error("session {0} is already in the history")]
    DuplicateSession(SessionId),

    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid history row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Failures while loading or saving the user configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Values typed by the operator that cannot be accepted as given
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("volley size must be 3 or 6, got {0}")]
    InvalidVolleySize(String),

    #[error("shooting distance must not be blank")]
    BlankDistance,

    #[error("expected two coordinates like `1.5 -0.25`, got `{0}`")]
    BadCoordinates(String),

    #[error("impact ({x:.2}, {y:.2}) is outside the capture area")]
    OutsideCaptureArea { x: f64, y: f64 },

    #[error("invalid timestamp `{0}`")]
    BadTimestamp(String),
}
