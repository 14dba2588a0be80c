use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Journal database under $HOME/.local/state/attune, with a
    /// platform-specific fallback.
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("attune");
            Some(state_dir.join("journal.db"))
        } else {
            ProjectDirs::from("", "", "attune")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("journal.db"))
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "attune").map(|pd| pd.config_dir().join("config.json"))
    }

    /// Append-only CSV of completed sessions, next to the config.
    pub fn session_log_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "attune").map(|pd| pd.config_dir().join("log.csv"))
    }
}
