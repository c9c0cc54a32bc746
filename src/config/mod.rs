//! Configuration management for pgxport
//!
//! Settings come from a TOML file and the command line:
//!
//! 1. Command-line arguments (highest)
//! 2. Configuration file (`--config`, else `~/.pgxport/config.toml` if present)
//! 3. Default values
//!
//! ```toml
//! [export]
//! format = "csv"
//! delimiter = ";"
//! compression = "gzip"
//! time_format = "dd/MM/yyyy HH:mm"
//! time_zone = "Europe/Paris"
//!
//! [logging]
//! level = "info"
//! timestamps = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::error::{ConfigError, Result};
use crate::export::options::{
    ExportOptions, parse_delimiter, validate_time_layout, validate_time_zone,
};
use crate::formatter::DEFAULT_TIME_LAYOUT;
use crate::output::Compression;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Export defaults
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default export settings, overridden by command-line flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Output format (csv, json, xml, yaml, sql, xlsx, template)
    #[serde(default = "default_format")]
    pub format: String,

    /// CSV delimiter; `\t` for tab
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Compression (none, gzip, zip, zstd, lz4)
    #[serde(default = "default_compression")]
    pub compression: String,

    /// Time layout
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// IANA time zone; empty for local time
    #[serde(default)]
    pub time_zone: String,

    #[serde(default)]
    pub no_header: bool,

    #[serde(default = "default_xml_root_tag")]
    pub xml_root_tag: String,

    #[serde(default = "default_xml_row_tag")]
    pub xml_row_tag: String,

    /// Rows per INSERT statement
    #[serde(default = "default_insert_batch")]
    pub insert_batch: usize,

    /// Show a progress spinner
    #[serde(default)]
    pub progress: bool,

    /// Treat an empty result as an error
    #[serde(default)]
    pub fail_on_empty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
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

// Default value functions
fn default_format() -> String {
    "csv".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_compression() -> String {
    Compression::None.as_str().to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_LAYOUT.to_string()
}

fn default_xml_root_tag() -> String {
    "results".to_string()
}

fn default_xml_row_tag() -> String {
    "row".to_string()
}

fn default_insert_batch() -> usize {
    1
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: default_format(),
            delimiter: default_delimiter(),
            compression: default_compression(),
            time_format: default_time_format(),
            time_zone: String::new(),
            no_header: false,
            xml_root_tag: default_xml_root_tag(),
            xml_row_tag: default_xml_row_tag(),
            insert_batch: default_insert_batch(),
            progress: false,
            fail_on_empty: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFormat(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration with proper precedence
    ///
    /// An explicit path must exist. Otherwise the default path is used when
    /// present, and built-in defaults when not.
    ///
    /// # Returns
    /// * `Result<Config>` - Validated configuration or error
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path();
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.pgxport/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pgxport")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        let export = &self.export;
        parse_delimiter(&export.delimiter)?;
        export.compression.parse::<Compression>()?;
        validate_time_layout(&export.time_format)?;
        validate_time_zone(&export.time_zone)?;

        if export.insert_batch < 1 {
            return Err(ConfigError::InvalidValue {
                field: "export.insert_batch".to_string(),
                value: export.insert_batch.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ExportDefaults {
    /// Export options seeded from these defaults
    ///
    /// # Arguments
    /// * `output` - Output path of the export
    pub fn to_options(&self, output: impl Into<PathBuf>) -> Result<ExportOptions> {
        let mut options = ExportOptions::new(&self.format, output);
        options.delimiter = parse_delimiter(&self.delimiter)?;
        options.compression = self.compression.parse()?;
        options.time_format = self.time_format.clone();
        options.time_zone = self.time_zone.clone();
        options.no_header = self.no_header;
        options.xml_root_tag = self.xml_root_tag.clone();
        options.xml_row_tag = self.xml_row_tag.clone();
        options.rows_per_statement = self.insert_batch;
        options.progress = self.progress;
        Ok(options)
    }
}

impl LoggingConfig {
    /// Build the log filter
    ///
    /// `directives` uses the `RUST_LOG` syntax. When absent or empty the
    /// configured level applies; invalid directives are skipped.
    ///
    /// # Arguments
    /// * `directives` - Filter directives, usually the `RUST_LOG` value
    pub fn log_filter(&self, directives: Option<&str>) -> EnvFilter {
        let default = LevelFilter::from_level(self.level.to_tracing_level());
        EnvFilter::builder()
            .with_default_directive(default.into())
            .parse_lossy(directives.unwrap_or_default().trim())
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
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.export.format, "csv");
        assert_eq!(config.export.delimiter, ",");
        assert_eq!(config.export.time_format, "yyyy-MM-dd HH:mm:ss");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [export]
            delimiter = "\\t"
            compression = "zstd"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.export.format, "csv");
        assert_eq!(config.export.xml_root_tag, "results");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.timestamps);

        let options = config.export.to_options("out.csv").unwrap();
        assert_eq!(options.delimiter, '\t');
        assert_eq!(options.compression, Compression::Zstd);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.export.compression = "brotli".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.time_zone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.insert_batch = 0;
        assert!(config.validate().is_err());

        assert!(Config::from_toml("[export\nformat = ").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[export]\nformat = \"json\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.export.format, "json");
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_log_filter_directives() {
        let logging = LoggingConfig {
            level: LogLevel::Warn,
            timestamps: false,
        };
        assert_eq!(logging.log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(logging.log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            logging.log_filter(Some("trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
