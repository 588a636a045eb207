//! Configuration management for mongotools
//!
//! Settings come from a TOML file, by default `~/.mongotools/config.toml`.
//! Every field has a default, so a missing file or a partial file is fine.
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bsonutil::ExtJsonMode;
use crate::error::{ConfigError, Result};

/// Largest indent accepted for pretty output
pub const MAX_INDENT: usize = 16;

/// Smallest abbreviation width that still leaves room for both ends
pub const MIN_ABBREVIATE: usize = 16;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Wire decoding configuration
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// Display and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Extended JSON flavor (legacy, canonical)
    #[serde(default)]
    pub format: ExtJsonMode,

    /// Break documents over several lines
    #[serde(default)]
    pub pretty: bool,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,

    /// Spaces per nesting level in pretty output
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Shorten decoded documents to this many characters
    #[serde(default)]
    pub abbreviate: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default)]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Wire decoding configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Skip undecodable messages instead of stopping
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_color_output() -> bool {
    true
}

fn default_indent() -> usize {
    2
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: ExtJsonMode::default(),
            pretty: false,
            color_output: default_color_output(),
            indent: default_indent(),
            abbreviate: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: false,
        }
    }
}

impl Config {
    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.mongotools/config.toml`, relative to the working
    ///   directory when there is no home directory
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mongotools")
            .join("config.toml")
    }

    /// Load configuration from a file
    ///
    /// A missing file at the default location yields the defaults. A
    /// missing file that was asked for explicitly is an error.
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, or `None` for the default location
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error naming the first bad field otherwise
    pub fn validate(&self) -> Result<()> {
        if self.display.indent > MAX_INDENT {
            return Err(ConfigError::InvalidValue {
                field: "display.indent".to_string(),
                value: self.display.indent.to_string(),
            }
            .into());
        }

        if let Some(width) = self.display.abbreviate
            && width < MIN_ABBREVIATE
        {
            return Err(ConfigError::InvalidValue {
                field: "display.abbreviate".to_string(),
                value: width.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolsError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.display.format, ExtJsonMode::Legacy);
        assert!(config.display.color_output);
        assert!(!config.display.pretty);
        assert_eq!(config.display.indent, 2);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.decode.continue_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [display]
            format = "canonical"
            pretty = true

            [decode]
            continue_on_error = true
            "#,
        )
        .unwrap();
        assert_eq!(config.display.format, ExtJsonMode::Canonical);
        assert!(config.display.pretty);
        assert!(config.display.color_output);
        assert!(config.decode.continue_on_error);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[display]\nformat = \"yaml\"").unwrap_err();
        assert!(matches!(err, ToolsError::Config(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.display.indent = 17;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display.abbreviate = Some(8);
        assert!(config.validate().is_err());
        config.display.abbreviate = Some(MIN_ABBREVIATE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.display.abbreviate = Some(80);
        config.logging.level = LogLevel::Debug;
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\ntimestamps = true\n").unwrap();
        let config = Config::load_from_file(Some(&path)).unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.logging.timestamps);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from_file(Some(&missing)).unwrap_err(),
            ToolsError::Config(ConfigError::FileNotFound(_))
        ));
    }
}
