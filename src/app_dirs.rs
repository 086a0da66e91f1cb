use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/quiver`, or the platform data dir without a HOME
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("quiver"))
        } else {
            ProjectDirs::from("", "", "quiver").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "quiver").map(|pd| pd.config_dir().join("config.json"))
    }

    pub fn history_csv_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("history.csv"))
            .unwrap_or_else(|| PathBuf::from("quiver_history.csv"))
    }

    pub fn history_db_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("history.db"))
            .unwrap_or_else(|| PathBuf::from("quiver_history.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("quiver.log"))
    }
}
