use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::history::{CsvHistory, HistoryBackend, SqliteHistory};
use crate::shot::{DistanceLabel, VolleySize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Csv,
    Sqlite,
}

/// Persistent defaults; command line flags take precedence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Arrows per volley, 3 or 6. Unset means ask.
    pub volley_size: Option<u8>,
    /// Shooting distance label. Unset means ask.
    pub distance: Option<String>,
    pub backend: BackendKind,
    pub history_path: Option<PathBuf>,
}

impl Config {
    /// Volley size checked at the point of entry, never coerced
    pub fn volley_size(&self) -> Result<Option<VolleySize>, ConfigError> {
        self.volley_size
            .map(VolleySize::try_from)
            .transpose()
            .map_err(ConfigError::from)
    }

    pub fn distance(&self) -> Result<Option<DistanceLabel>, ConfigError> {
        self.distance
            .as_deref()
            .map(str::parse::<DistanceLabel>)
            .transpose()
            .map_err(ConfigError::from)
    }

    pub fn history_backend(&self) -> Box<dyn HistoryBackend> {
        match self.backend {
            BackendKind::Csv => Box::new(CsvHistory::with_path(
                self.history_path.clone().unwrap_or_else(AppDirs::history_csv_path),
            )),
            BackendKind::Sqlite => Box::new(SqliteHistory::with_path(
                self.history_path.clone().unwrap_or_else(AppDirs::history_db_path),
            )),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("quiver_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file yields the defaults; a malformed one is an error
    fn load(&self) -> Result<Config, ConfigError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice::<Config>(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data).map_err(|e| self.io_error(e))
    }
}
