//! Export options
//!
//! [`ExportOptions`] is the immutable configuration snapshot for one export
//! call, built once by the command line layer (or a library caller) and only
//! read by the exporters.

use std::path::PathBuf;

use chrono_tz::Tz;

use crate::error::{ConfigError, Result};
use crate::formatter::{DEFAULT_TIME_LAYOUT, TimeContext, TimeLayout};
use crate::output::{Compression, SinkConfig};

pub const FORMAT_CSV: &str = "csv";
pub const FORMAT_JSON: &str = "json";
pub const FORMAT_XML: &str = "xml";
pub const FORMAT_YAML: &str = "yaml";
pub const FORMAT_SQL: &str = "sql";
pub const FORMAT_XLSX: &str = "xlsx";
pub const FORMAT_TEMPLATE: &str = "template";

/// Configuration for one export call.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Registered exporter name
    pub format: String,

    /// Requested output path; compression may rewrite it
    pub output_path: PathBuf,

    /// CSV field delimiter, a single ASCII character
    pub delimiter: char,

    pub compression: Compression,

    /// Time layout using `yyyy MM dd HH mm ss SSS` tokens
    pub time_format: String,

    /// IANA zone name; empty means the local zone
    pub time_zone: String,

    /// Skip the header row (CSV, XLSX)
    pub no_header: bool,

    pub xml_root_tag: String,
    pub xml_row_tag: String,

    /// Target table for SQL INSERT statements
    pub table_name: String,

    /// Rows per INSERT statement, at least 1
    pub rows_per_statement: usize,

    /// Full-mode template
    pub template_file: Option<PathBuf>,

    /// Streaming-mode templates; the row template is required in that mode
    pub template_header: Option<PathBuf>,
    pub template_row: Option<PathBuf>,
    pub template_footer: Option<PathBuf>,

    /// Render header/row/footer templates instead of one full template
    pub template_streaming: bool,

    /// Show a progress spinner on stderr
    pub progress: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: FORMAT_CSV.to_string(),
            output_path: PathBuf::new(),
            delimiter: ',',
            compression: Compression::None,
            time_format: DEFAULT_TIME_LAYOUT.to_string(),
            time_zone: String::new(),
            no_header: false,
            xml_root_tag: "results".to_string(),
            xml_row_tag: "row".to_string(),
            table_name: String::new(),
            rows_per_statement: 1,
            template_file: None,
            template_header: None,
            template_row: None,
            template_footer: None,
            template_streaming: false,
            progress: false,
        }
    }
}

impl ExportOptions {
    /// Options for `format` written to `output_path`, everything else default.
    pub fn new(format: &str, output_path: impl Into<PathBuf>) -> Self {
        Self {
            format: normalize_format(format),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    /// Sink description for this export.
    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig::new(self.output_path.clone(), self.compression, &self.format)
    }

    /// Resolve the time layout and zone once for the whole export.
    pub fn time_context(&self) -> TimeContext {
        TimeContext::resolve(&self.time_format, &self.time_zone)
    }

    /// Delimiter as the single byte the CSV writer expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or_else(|| invalid("delimiter", &self.delimiter.to_string()))
    }

    /// Check the options before any row is read.
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, a configuration error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("output".to_string()).into());
        }

        validate_time_layout(&self.time_format)?;
        validate_time_zone(&self.time_zone)?;

        match self.format.as_str() {
            FORMAT_CSV => {
                self.delimiter_byte()?;
            }
            FORMAT_SQL => {
                if self.table_name.trim().is_empty() {
                    return Err(ConfigError::MissingField("table".to_string()).into());
                }
                if self.rows_per_statement < 1 {
                    return Err(invalid(
                        "insert-batch",
                        &self.rows_per_statement.to_string(),
                    ));
                }
            }
            FORMAT_XML => {
                for (field, tag) in [("xml-root-tag", &self.xml_root_tag), ("xml-row-tag", &self.xml_row_tag)] {
                    if tag.trim().is_empty() || tag.contains(char::is_whitespace) {
                        return Err(invalid(field, tag));
                    }
                }
            }
            FORMAT_TEMPLATE => self.validate_template()?,
            _ => {}
        }

        Ok(())
    }

    fn validate_template(&self) -> Result<()> {
        let has_full = self.template_file.is_some();
        let has_streaming = self.template_row.is_some()
            || self.template_header.is_some()
            || self.template_footer.is_some();

        if has_full && has_streaming {
            return Err(invalid(
                "template",
                "use either a full template or header/row/footer templates, not both",
            ));
        }
        if self.template_streaming && self.template_row.is_none() {
            return Err(ConfigError::MissingField("tpl-row".to_string()).into());
        }
        if !self.template_streaming && !has_full {
            return Err(ConfigError::MissingField("tpl-file".to_string()).into());
        }
        Ok(())
    }
}

/// Normalize a format name the way the registry does.
pub fn normalize_format(format: &str) -> String {
    format.trim().to_lowercase()
}

/// Parse a delimiter argument.
///
/// Surrounding whitespace is ignored, `\t` (backslash, t) selects a tab, and
/// anything else must be exactly one ASCII character.
pub fn parse_delimiter(raw: &str) -> Result<char> {
    let trimmed = raw.trim();
    if trimmed == "\\t" {
        return Ok('\t');
    }
    if raw.contains('\t') && trimmed.is_empty() {
        return Ok('\t');
    }

    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        (None, _) => Err(ConfigError::MissingField("delimiter".to_string()).into()),
        _ => Err(invalid("delimiter", raw)),
    }
}

/// A layout must not be empty and must contain at least one date or time
/// token.
pub fn validate_time_layout(layout: &str) -> Result<()> {
    if layout.is_empty() || !TimeLayout::parse(layout).has_tokens() {
        return Err(invalid("time-format", layout));
    }
    Ok(())
}

/// The empty zone (local time) or a known IANA zone name.
pub fn validate_time_zone(zone: &str) -> Result<()> {
    if zone.trim().is_empty() || zone.trim().parse::<Tz>().is_ok() {
        Ok(())
    } else {
        Err(invalid("time-zone", zone))
    }
}

fn invalid(field: &str, value: &str) -> crate::error::ExportError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(format: &str) -> ExportOptions {
        ExportOptions::new(format, "/tmp/out")
    }

    #[test]
    fn test_defaults() {
        let opts = options(" CSV ");
        assert_eq!(opts.format, "csv");
        assert_eq!(opts.delimiter, ',');
        assert_eq!(opts.time_format, "yyyy-MM-dd HH:mm:ss");
        assert_eq!(opts.xml_root_tag, "results");
        assert_eq!(opts.xml_row_tag, "row");
        assert_eq!(opts.rows_per_statement, 1);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_delimiter_must_be_ascii() {
        let mut opts = options("csv");
        opts.delimiter = '\t';
        assert_eq!(opts.delimiter_byte().unwrap(), b'\t');
        opts.delimiter = '§';
        assert!(opts.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_sql_requires_table_and_batch() {
        let mut opts = options("sql");
        assert!(opts.validate().is_err());
        opts.table_name = "public.users".to_string();
        assert!(opts.validate().is_ok());
        opts.rows_per_statement = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_template_modes() {
        let mut opts = options("template");
        assert!(opts.validate().is_err());

        opts.template_file = Some(PathBuf::from("full.tpl"));
        assert!(opts.validate().is_ok());

        opts.template_row = Some(PathBuf::from("row.tpl"));
        assert!(opts.validate().is_err());

        opts.template_file = None;
        opts.template_streaming = true;
        assert!(opts.validate().is_ok());

        opts.template_row = None;
        opts.template_header = Some(PathBuf::from("header.tpl"));
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_time_validation() {
        assert!(validate_time_layout("dd/MM/yyyy").is_ok());
        assert!(validate_time_layout("").is_err());
        assert!(validate_time_layout("no tokens").is_err());
        assert!(validate_time_zone("").is_ok());
        assert!(validate_time_zone("Europe/Paris").is_ok());
        assert!(validate_time_zone("Nowhere/Special").is_err());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter(" | ").unwrap(), '|');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter("\t").unwrap(), '\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn test_missing_output_path() {
        let opts = ExportOptions::new("json", "");
        assert!(opts.validate().is_err());
    }
}
