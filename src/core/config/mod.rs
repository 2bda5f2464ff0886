//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order, first hit wins:
//! 1. `$RESULTSTORE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/resultstore/config.toml`
//! 3. `~/.resultstore/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use resultstore::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let policy = config.retry_policy().unwrap();
//! println!("open attempts: {}", policy.max_attempts());
//! ```

pub mod schema;

pub use schema::{FileConfig, OutputConfig, RetryConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::store::retry::RetryPolicy;
use crate::ui::output::Verbosity;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RESULTSTORE_CONFIG";

/// Default number of open attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default upper bound of the wait between open attempts, in seconds.
pub const DEFAULT_MAX_WAIT_SECONDS: f64 = 10.0;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (all fields optional)
    pub file: FileConfig,
    /// Path the config was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read,
    /// parsed, or validated. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Locate the first existing config file.
    fn find() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("resultstore/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".resultstore/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Path the configuration was loaded from.
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.resultstore/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".resultstore/config.toml"))
    }

    /// Write config to the canonical location atomically.
    pub fn write_global(file: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_to(&path, file)?;
        Ok(path)
    }

    /// Write config to `path` atomically (temp file, fsync, rename).
    pub fn write_to(path: &Path, file: &FileConfig) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut out = fs::File::create(&temp_path).map_err(write_err)?;
        out.write_all(contents.as_bytes()).map_err(write_err)?;
        out.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Number of open attempts. Defaults to 10.
    pub fn max_attempts(&self) -> u32 {
        self.file
            .retry
            .as_ref()
            .and_then(|r| r.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    /// Maximum wait between open attempts. Defaults to 10 seconds.
    pub fn max_wait_seconds(&self) -> f64 {
        self.file
            .retry
            .as_ref()
            .and_then(|r| r.max_wait_seconds)
            .unwrap_or(DEFAULT_MAX_WAIT_SECONDS)
    }

    /// Build the retry policy described by this config.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let wait = Duration::try_from_secs_f64(self.max_wait_seconds())
            .map_err(|e| ConfigError::InvalidValue(format!("retry.max_wait_seconds: {}", e)))?;
        RetryPolicy::new(self.max_attempts(), wait)
    }

    /// Logger verbosity. Defaults to `info`.
    pub fn verbosity(&self) -> Verbosity {
        self.file
            .output
            .as_ref()
            .and_then(|o| o.verbosity)
            .unwrap_or_default()
    }

    /// Whether to overwrite non-empty groups. Defaults to `false`.
    pub fn overwrite(&self) -> bool {
        self.file
            .output
            .as_ref()
            .and_then(|o| o.overwrite)
            .unwrap_or(false)
    }
}
