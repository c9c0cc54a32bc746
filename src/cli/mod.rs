//! Command-line interface for pgxport
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and flag overrides
//! - Building the [`ExportOptions`] for one run

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::{Config, LogLevel};
use crate::error::{ConfigError, Result};
use crate::export::{ExportOptions, FORMAT_TEMPLATE};
use crate::export::options::{normalize_format, parse_delimiter};

/// Export a query result set to CSV, JSON, XML, YAML, SQL, XLSX or a template
#[derive(Parser, Debug)]
#[command(
    name = "pgxport",
    version,
    about = "Export PostgreSQL result sets to files",
    long_about = "Streams a result set into one output file in the chosen format,
with optional gzip, zip, zstd or lz4 compression.

The result set is read from a replay file: newline-delimited JSON whose first
line lists the columns and their types, followed by one array per row."
)]
pub struct CliArgs {
    /// Replay file holding the result set
    #[arg(
        short = 'i',
        long,
        value_name = "FILE",
        required_unless_present = "list_formats"
    )]
    pub input: Option<PathBuf>,

    /// Output file path
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        required_unless_present = "list_formats"
    )]
    pub output: Option<PathBuf>,

    /// Output format (csv, json, xml, yaml, sql, xlsx, template)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Compression (none, gzip, zip, zstd, lz4)
    #[arg(short = 'z', long, value_name = "MODE")]
    pub compression: Option<String>,

    /// CSV delimiter; `\t` for tab
    #[arg(short = 'D', long, value_name = "CHAR", allow_hyphen_values = true)]
    pub delimiter: Option<String>,

    /// Omit the header row (CSV, XLSX)
    #[arg(short = 'n', long)]
    pub no_header: bool,

    /// Name of the XML root element
    #[arg(long, value_name = "TAG")]
    pub xml_root_tag: Option<String>,

    /// Name of the XML element wrapping each row
    #[arg(long, value_name = "TAG")]
    pub xml_row_tag: Option<String>,

    /// Target table for SQL INSERT statements
    #[arg(short = 't', long, value_name = "NAME")]
    pub table: Option<String>,

    /// Rows per INSERT statement
    #[arg(long, value_name = "N")]
    pub insert_batch: Option<usize>,

    /// Template rendered once with every row
    #[arg(long, value_name = "FILE")]
    pub tpl_file: Option<PathBuf>,

    /// Template rendered before the first row (streaming mode)
    #[arg(long, value_name = "FILE")]
    pub tpl_header: Option<PathBuf>,

    /// Template rendered for each row (streaming mode)
    #[arg(long, value_name = "FILE")]
    pub tpl_row: Option<PathBuf>,

    /// Template rendered after the last row (streaming mode)
    #[arg(long, value_name = "FILE")]
    pub tpl_footer: Option<PathBuf>,

    /// Time layout, e.g. "dd/MM/yyyy HH:mm"
    #[arg(short = 'T', long, value_name = "LAYOUT")]
    pub time_format: Option<String>,

    /// IANA time zone for timestamptz values, e.g. "Europe/Paris"
    #[arg(short = 'Z', long, value_name = "ZONE")]
    pub time_zone: Option<String>,

    /// Exit with an error when the result set is empty
    #[arg(short = 'x', long)]
    pub fail_on_empty: bool,

    /// Show a progress spinner
    #[arg(long)]
    pub progress: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// List the registered export formats and exit
    #[arg(long)]
    pub list_formats: bool,
}

/// CLI interface handler
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load the configuration
    ///
    /// # Returns
    /// * `Result<Self>` - CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build the interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file, then apply logging flags
    ///
    /// # Arguments
    /// * `args` - Parsed CLI arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        Ok(config)
    }

    /// Get the configuration
    ///
    /// # Returns
    /// * `&Config` - Reference to configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    ///
    /// # Returns
    /// * `&CliArgs` - Reference to arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Replay file to read rows from
    pub fn input_path(&self) -> Result<&Path> {
        self.args
            .input
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField("input".to_string()).into())
    }

    /// Whether an empty result set should fail the run
    pub fn fail_on_empty(&self) -> bool {
        self.args.fail_on_empty || self.config.export.fail_on_empty
    }

    /// Build the export options for this run
    ///
    /// Values come from the configuration defaults, overridden by any flag
    /// given on the command line. The options are validated before return.
    ///
    /// # Returns
    /// * `Result<ExportOptions>` - Validated options or a configuration error
    pub fn export_options(&self) -> Result<ExportOptions> {
        let args = &self.args;
        let output = args
            .output
            .clone()
            .ok_or_else(|| ConfigError::MissingField("output".to_string()))?;

        let mut options = self.config.export.to_options(output)?;

        if let Some(format) = &args.format {
            options.format = normalize_format(format);
        }
        if let Some(compression) = &args.compression {
            options.compression = compression.parse()?;
        }
        if let Some(delimiter) = &args.delimiter {
            options.delimiter = parse_delimiter(delimiter)?;
        }
        if args.no_header {
            options.no_header = true;
        }
        if let Some(tag) = &args.xml_root_tag {
            options.xml_root_tag = tag.clone();
        }
        if let Some(tag) = &args.xml_row_tag {
            options.xml_row_tag = tag.clone();
        }
        if let Some(table) = &args.table {
            options.table_name = table.clone();
        }
        if let Some(batch) = args.insert_batch {
            options.rows_per_statement = batch;
        }
        if let Some(layout) = &args.time_format {
            options.time_format = layout.clone();
        }
        if let Some(zone) = &args.time_zone {
            options.time_zone = zone.clone();
        }
        if args.progress {
            options.progress = true;
        }

        if options.format == FORMAT_TEMPLATE {
            options.template_file = args.tpl_file.clone();
            options.template_header = args.tpl_header.clone();
            options.template_row = args.tpl_row.clone();
            options.template_footer = args.tpl_footer.clone();
            options.template_streaming = args.tpl_file.is_none();
        }

        options.validate()?;
        Ok(options)
    }

    /// Apply CLI arguments to configuration
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_logging_args(config, args);
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Compression;
    use std::fs;
    use tempfile::TempDir;

    /// Interface backed by an explicit (possibly empty) config file, so the
    /// user's own `~/.pgxport/config.toml` never leaks into a test.
    fn interface(dir: &TempDir, config: &str, extra: &[&str]) -> CliInterface {
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, config).unwrap();

        let mut argv = vec![
            "pgxport",
            "-i",
            "rows.ndjson",
            "-c",
            config_path.to_str().unwrap(),
        ];
        argv.extend_from_slice(extra);
        CliInterface::from_args(CliArgs::try_parse_from(argv).unwrap()).unwrap()
    }

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::try_parse_from(["pgxport", "-i", "in.ndjson", "-o", "out.csv"]);
        assert!(args.is_ok());
    }

    #[test]
    fn test_input_and_output_required() {
        assert!(CliArgs::try_parse_from(["pgxport", "-o", "out.csv"]).is_err());
        assert!(CliArgs::try_parse_from(["pgxport", "-i", "in.ndjson"]).is_err());
        assert!(CliArgs::try_parse_from(["pgxport", "--list-formats"]).is_ok());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(CliArgs::try_parse_from(["pgxport", "--list-formats", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_cli_args_with_flags() {
        let args = CliArgs::try_parse_from([
            "pgxport", "-i", "in", "-o", "out", "-f", "sql", "-t", "public.users",
            "--insert-batch", "50", "-z", "gzip", "-x", "-n",
        ])
        .unwrap();
        assert_eq!(args.format.as_deref(), Some("sql"));
        assert_eq!(args.table.as_deref(), Some("public.users"));
        assert_eq!(args.insert_batch, Some(50));
        assert!(args.fail_on_empty);
        assert!(args.no_header);
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let cli = interface(
            &dir,
            "[export]\nformat = \"json\"\ncompression = \"zstd\"\ndelimiter = \";\"\n",
            &["-o", "out.csv", "-f", "CSV", "-D", "\\t"],
        );

        let options = cli.export_options().unwrap();
        assert_eq!(options.format, "csv");
        assert_eq!(options.delimiter, '\t');
        assert_eq!(options.compression, Compression::Zstd);
    }

    #[test]
    fn test_config_supplies_defaults() {
        let dir = TempDir::new().unwrap();
        let cli = interface(
            &dir,
            "[export]\nformat = \"xml\"\nxml_root_tag = \"users\"\nfail_on_empty = true\n",
            &["-o", "out.xml"],
        );

        let options = cli.export_options().unwrap();
        assert_eq!(options.format, "xml");
        assert_eq!(options.xml_root_tag, "users");
        assert!(cli.fail_on_empty());
    }

    #[test]
    fn test_template_mode_selection() {
        let dir = TempDir::new().unwrap();
        let full = interface(&dir, "", &["-o", "out.txt", "-f", "template", "--tpl-file", "a.tpl"]);
        assert!(!full.export_options().unwrap().template_streaming);

        let streaming = interface(&dir, "", &["-o", "out.txt", "-f", "template", "--tpl-row", "r.tpl"]);
        assert!(streaming.export_options().unwrap().template_streaming);

        let both = interface(
            &dir,
            "",
            &["-o", "out.txt", "-f", "template", "--tpl-file", "a.tpl", "--tpl-row", "r.tpl"],
        );
        assert!(both.export_options().unwrap_err().is_config());

        let neither = interface(&dir, "", &["-o", "out.txt", "-f", "template"]);
        assert!(neither.export_options().is_err());
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let dir = TempDir::new().unwrap();
        let bad_zone = interface(&dir, "", &["-o", "out.csv", "-Z", "Mars/Olympus"]);
        assert!(bad_zone.export_options().is_err());

        let bad_compression = interface(&dir, "", &["-o", "out.csv", "-z", "rar"]);
        assert!(bad_compression.export_options().is_err());

        let missing_table = interface(&dir, "", &["-o", "out.sql", "-f", "sql"]);
        assert!(missing_table.export_options().is_err());
    }

    #[test]
    fn test_logging_args() {
        let dir = TempDir::new().unwrap();
        let verbose = interface(&dir, "", &["-o", "out.csv", "-v"]);
        assert_eq!(verbose.config().logging.level, LogLevel::Debug);

        let quiet = interface(&dir, "[logging]\nlevel = \"trace\"\n", &["-o", "out.csv", "-q"]);
        assert_eq!(quiet.config().logging.level, LogLevel::Error);

        let default = interface(&dir, "[logging]\nlevel = \"warn\"\n", &["-o", "out.csv"]);
        assert_eq!(default.config().logging.level, LogLevel::Warn);
    }
}
