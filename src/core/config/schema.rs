//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: the retry budget must allow
//! at least one attempt and the maximum wait must be a finite,
//! non-negative number of seconds.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::ui::output::Verbosity;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_attempts = 10
/// max_wait_seconds = 10.0
///
/// [output]
/// verbosity = "info"
/// overwrite = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Store-open retry settings
    pub retry: Option<RetryConfig>,

    /// Output and policy defaults
    pub output: Option<OutputConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }

    /// Set a dotted key such as `retry.max_attempts` from its string form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown key, a value that
    /// does not parse, or a value that fails validation.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let bad = |e: &dyn std::fmt::Display| {
            ConfigError::InvalidValue(format!("{} = {}: {}", key, value, e))
        };

        match key {
            "retry.max_attempts" => {
                self.retry.get_or_insert_with(Default::default).max_attempts =
                    Some(value.parse().map_err(|e| bad(&e))?);
            }
            "retry.max_wait_seconds" => {
                self.retry
                    .get_or_insert_with(Default::default)
                    .max_wait_seconds = Some(value.parse().map_err(|e| bad(&e))?);
            }
            "output.verbosity" => {
                self.output.get_or_insert_with(Default::default).verbosity =
                    Some(value.parse().map_err(|e| bad(&e))?);
            }
            "output.overwrite" => {
                self.output.get_or_insert_with(Default::default).overwrite =
                    Some(value.parse().map_err(|e| bad(&e))?);
            }
            _ => {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown configuration key '{}'",
                    key
                )))
            }
        }
        self.validate()
    }
}

/// Retry settings for opening a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Number of open attempts before giving up
    pub max_attempts: Option<u32>,

    /// Upper bound of the random wait between attempts, in seconds
    pub max_wait_seconds: Option<f64>,
}

impl RetryConfig {
    /// Validate the retry settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(attempts) = self.max_attempts {
            if attempts == 0 {
                return Err(ConfigError::InvalidValue(
                    "retry.max_attempts must be at least 1".to_string(),
                ));
            }
        }
        if let Some(wait) = self.max_wait_seconds {
            if !wait.is_finite() || wait < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "retry.max_wait_seconds must be a non-negative number, got {}",
                    wait
                )));
            }
        }
        Ok(())
    }
}

/// Output defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Logger verbosity
    pub verbosity: Option<Verbosity>,

    /// Whether existing non-empty groups are overwritten by default
    pub overwrite: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_parses() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn full_file_parses() {
        let config: FileConfig = toml::from_str(
            r#"
            [retry]
            max_attempts = 3
            max_wait_seconds = 0.5

            [output]
            verbosity = "warning"
            overwrite = true
            "#,
        )
        .unwrap();

        let retry = config.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, Some(3));
        assert_eq!(retry.max_wait_seconds, Some(0.5));
        let output = config.output.as_ref().unwrap();
        assert_eq!(output.verbosity, Some(Verbosity::Warning));
        assert_eq!(output.overwrite, Some(true));
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[retry]\nbogus = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let retry = RetryConfig {
            max_attempts: Some(0),
            max_wait_seconds: None,
        };
        assert!(matches!(retry.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn set_key_updates_sections() {
        let mut config = FileConfig::default();
        config.set_key("retry.max_attempts", "4").unwrap();
        config.set_key("output.verbosity", "debug").unwrap();
        config.set_key("output.overwrite", "true").unwrap();

        assert_eq!(config.retry.as_ref().unwrap().max_attempts, Some(4));
        let output = config.output.as_ref().unwrap();
        assert_eq!(output.verbosity, Some(Verbosity::Debug));
        assert_eq!(output.overwrite, Some(true));
    }

    #[test]
    fn set_key_rejects_bad_input() {
        let mut config = FileConfig::default();
        assert!(config.set_key("retry.bogus", "1").is_err());
        assert!(config.set_key("retry.max_attempts", "many").is_err());
        assert!(config.set_key("retry.max_attempts", "0").is_err());
        assert!(config.set_key("output.verbosity", "loud").is_err());
    }

    #[test]
    fn negative_wait_rejected() {
        let retry = RetryConfig {
            max_attempts: None,
            max_wait_seconds: Some(-1.0),
        };
        assert!(retry.validate().is_err());

        let retry = RetryConfig {
            max_attempts: None,
            max_wait_seconds: Some(f64::NAN),
        };
        assert!(retry.validate().is_err());
    }
}
