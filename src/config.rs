//! Configuration for doorkit doors.
//!
//! Settings are read from `~/.doorkit/config.toml` unless a path is given
//! explicitly. Every key is optional:
//!
//! ```toml
//! # Drop file format: door32 or doorsys
//! dialect = "door32"
//!
//! # Seconds without a keystroke before the caller is dropped
//! idle_timeout_secs = 300
//!
//! [art]
//! directory = "art"
//! line_delay_ms = 40
//!
//! [modal]
//! background = "modalBg.ans"
//! width = 33
//! ack_delay_ms = 1000
//!
//! [log]
//! level = "info"
//! file = "/var/log/doorkit.log"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dropfile::Dialect;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Drop file dialect
    pub dialect: Dialect,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
    /// Art playback settings
    pub art: ArtConfig,
    /// Modal dialog settings
    pub modal: ModalConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::Door32,
            idle_timeout_secs: 300,
            art: ArtConfig::default(),
            modal: ModalConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Art configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtConfig {
    pub directory: PathBuf,
    pub line_delay_ms: u64,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            line_delay_ms: 40,
        }
    }
}

/// Modal dialog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    pub background: PathBuf,
    pub width: u16,
    pub ack_delay_ms: u64,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from("modalBg.ans"),
            width: 33,
            ack_delay_ms: 1000,
        }
    }
}

/// Log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is an error; the caller decides whether to fall back.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_if_present(&path),
            None => Ok(Self::default()),
        }
    }

    /// Like [`Config::load_from`], but a missing file yields the defaults
    pub fn load_if_present(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `~/.doorkit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Log file location, `~/.doorkit/doorkit.log` unless configured
    pub fn log_path(&self) -> PathBuf {
        self.log
            .file
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("doorkit.log")))
            .unwrap_or_else(|| PathBuf::from("doorkit.log"))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.art.line_delay_ms)
    }

    pub fn modal_ack_delay(&self) -> Duration {
        Duration::from_millis(self.modal.ack_delay_ms)
    }

    /// Resolve an art file name against the art directory
    pub fn art_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.art.directory.join(name)
    }
}

fn data_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(|home| PathBuf::from(home).join(".doorkit"))
}
