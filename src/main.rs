//! pgxport - result set exporter
//!
//! Streams the rows of a query result into a single file in one of the
//! registered formats, optionally compressed.
//!
//! # Usage
//!
//! ```bash
//! # CSV with a semicolon delimiter, gzip compressed
//! pgxport -i users.ndjson -o users.csv -D ';' -z gzip
//!
//! # Batched INSERT statements
//! pgxport -i users.ndjson -o users.sql -f sql -t public.users --insert-batch 500
//! ```

use tracing::{info, warn};

use pgxport::cli::CliInterface;
use pgxport::cursor::ReplayCursor;
use pgxport::error::{ExportError, Result};
use pgxport::export::{ExportOptions, Registry, register_builtin_exporters};
use pgxport::output::resolve_output_path;

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Build the exporter registry
/// 4. Export the input rows
///
/// # Returns
/// * `Result<()>` - Success or error
fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    let mut registry = Registry::new();
    register_builtin_exporters(&mut registry)?;

    if cli.args().list_formats {
        for name in registry.list() {
            println!("{name}");
        }
        return Ok(());
    }

    let options = cli.export_options()?;
    let exporter = registry.get(&options.format)?;
    let input = cli.input_path()?;

    info!(
        "Exporting {} as {} (compression={})",
        input.display(),
        options.format,
        options.compression
    );

    let mut cursor = ReplayCursor::open(input)?;
    let rows = exporter.export(&mut cursor, &options)?;
    handle_export_result(rows, &options, cli.fail_on_empty())
}

/// Report the outcome of an export
///
/// # Arguments
/// * `rows` - Number of rows written
/// * `options` - Options the export ran with
/// * `fail_on_empty` - Whether zero rows is an error
fn handle_export_result(rows: u64, options: &ExportOptions, fail_on_empty: bool) -> Result<()> {
    let written = resolve_output_path(&options.output_path, options.compression);

    if rows == 0 {
        if fail_on_empty {
            return Err(ExportError::EmptyResult);
        }
        warn!("Query returned 0 rows, {} contains no data", written.display());
        return Ok(());
    }

    info!("Export completed: {rows} rows -> {}", written.display());
    Ok(())
}

/// Initialize logging system
///
/// # Arguments
/// * `cli` - CLI interface with configuration
fn initialize_logging(cli: &CliInterface) {
    let logging = &cli.config().logging;
    let directives = std::env::var("RUST_LOG").ok();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(logging.log_filter(directives.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_handling() {
        let options = ExportOptions::new("csv", "out.csv");
        assert!(handle_export_result(0, &options, false).is_ok());
        assert!(matches!(
            handle_export_result(0, &options, true),
            Err(ExportError::EmptyResult)
        ));
        assert!(handle_export_result(3, &options, true).is_ok());
    }
}
