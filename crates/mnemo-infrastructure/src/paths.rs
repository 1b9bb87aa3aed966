//! Unified path management for mnemo configuration and logs.
//!
//! ```text
//! ~/.config/mnemo/             # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/mnemo/        # Data directory
//! └── logs/                    # Application logs
//!     └── mnemo.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_NAME: &str = "mnemo";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "MNEMO_CONFIG";

pub struct MnemoPaths;

impl MnemoPaths {
    /// Returns the mnemo configuration directory (e.g. `~/.config/mnemo/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the config file path, honoring `MNEMO_CONFIG`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.trim().is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the mnemo data directory (e.g. `~/.local/share/mnemo/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the log directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
