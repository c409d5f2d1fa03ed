use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "clackr";

/// Where clackr keeps its files
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/clackr`, or the platform's local data dir
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|dirs| dirs.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("clackr_config.json"))
    }

    pub fn db_path() -> PathBuf {
        Self::state_dir().join("history.db")
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("clackr.log")
    }
}
