use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use flexi_logger::{Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capacity used when the config does not name one
pub const DEFAULT_CAPACITY: usize = 1000;

// Set only once a logger actually started. File output stops when the handle is dropped
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Tracker capacity must be at least 1")]
    ZeroCapacity,

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] FlexiLoggerError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum amount of messages remembered at once
    pub capacity: usize,
    /// Logger to start with the tracker. `None` leaves logging to the host
    pub log: Option<LogConfig>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            log: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// flexi_logger spec string, e.g. "info" or "gossip_tracker=trace"
    pub level: String,
    /// Write log files here. Without it, logs only go to stderr
    pub directory: Option<PathBuf>,
    /// Duplicate file output to stderr
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            stderr: true,
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validated_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.capacity).ok_or(ConfigError::ZeroCapacity)
    }
}

impl LogConfig {
    /// Start the global logger. Once a start succeeded, later calls do nothing.
    /// A failed start leaves logging uninitialized so the next call tries again
    pub fn init(&self) -> Result<(), ConfigError> {
        let mut handle = LOGGER_HANDLE.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_none() {
            *handle = Some(self.start_logger()?);
            info!("Logger initialized at level {}", self.level);
        }
        Ok(())
    }

    fn start_logger(&self) -> Result<LoggerHandle, ConfigError> {
        let mut logger = Logger::try_with_str(&self.level)?;

        match &self.directory {
            Some(directory) => {
                fs::create_dir_all(directory)?;
                logger = logger.log_to_file(FileSpec::default().directory(directory));
                if self.stderr {
                    logger = logger.duplicate_to_stderr(Duplicate::All);
                }
            }
            None => logger = logger.log_to_stderr(),
        }

        Ok(logger.start()?)
    }
}
