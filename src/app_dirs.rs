use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Log file location; the terminal belongs to the UI so logs go to disk
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("steer");
            Some(state_dir.join("steer.log"))
        } else {
            ProjectDirs::from("", "", "steer")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("steer.log"))
        }
    }
}
