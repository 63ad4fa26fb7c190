use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::plant::PlantOrder;
use crate::session::{Mode, SessionConfig, Settings};
use crate::signal::TargetFunction;

/// Upper bound on samples kept per chart series
pub const MAX_CAPACITY: u64 = 100_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("loop period must be at least 1 ms")]
    ZeroLoopPeriod,
    #[error("display window of {display_seconds} s is not a whole number of {loop_ms} ms ticks")]
    UnevenDisplayWindow { display_seconds: u64, loop_ms: u64 },
    #[error("display window must hold at least two samples, got {0}")]
    DisplayWindowTooShort(u64),
    #[error("display window must hold at most {max} samples, got {samples}")]
    DisplayWindowTooLong { samples: u64, max: u64 },
    #[error("{field} of {seconds} s is out of range")]
    TimingOutOfRange { field: &'static str, seconds: u64 },
    #[error("timeout must be positive")]
    ZeroTimeout,
    #[error("scoring margin must be a finite non-negative number, got {0}")]
    InvalidMargin(f64),
}

/// Persisted preferences and timing parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub target_function: TargetFunction,
    pub plant: PlantOrder,
    pub loop_ms: u64,
    pub display_seconds: u64,
    pub timeout_seconds: u64,
    pub countdown_seconds: u32,
    pub margin: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::ClosedLoopAuto,
            target_function: TargetFunction::Sine,
            plant: PlantOrder::Pt2,
            loop_ms: 50,
            display_seconds: 10,
            timeout_seconds: 15,
            countdown_seconds: 3,
            margin: 0.15,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mode: self.mode,
            target_function: self.target_function,
        }
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        if self.loop_ms == 0 {
            return Err(ConfigError::ZeroLoopPeriod);
        }
        let display_ms = to_millis("display window", self.display_seconds)?;
        if display_ms % self.loop_ms != 0 {
            return Err(ConfigError::UnevenDisplayWindow {
                display_seconds: self.display_seconds,
                loop_ms: self.loop_ms,
            });
        }
        let capacity = display_ms / self.loop_ms;
        if capacity < 2 {
            return Err(ConfigError::DisplayWindowTooShort(capacity));
        }
        if capacity > MAX_CAPACITY {
            return Err(ConfigError::DisplayWindowTooLong {
                samples: capacity,
                max: MAX_CAPACITY,
            });
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.margin));
        }
        let timeout_ms = to_millis("timeout", self.timeout_seconds)?;

        let loop_period = Duration::from_millis(self.loop_ms);
        Ok(Settings {
            loop_period,
            dt: loop_period.as_secs_f64(),
            display_seconds: self.display_seconds as f64,
            capacity: capacity as usize,
            timeout_ticks: timeout_ms.div_ceil(self.loop_ms),
            countdown_seconds: self.countdown_seconds,
            margin: self.margin,
            plant: self.plant,
        })
    }
}

fn to_millis(field: &'static str, seconds: u64) -> Result<u64, ConfigError> {
    seconds
        .checked_mul(1000)
        .ok_or(ConfigError::TimingOutOfRange { field, seconds })
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "steer") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("steer_config.json")
        };
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
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
