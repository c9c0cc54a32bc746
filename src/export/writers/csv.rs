//! CSV exporter
//!
//! Rows are written line by line through the `csv` crate with a
//! configurable single-byte delimiter and an optional header. The writer is
//! flushed at every progress checkpoint so a long export shows up on disk
//! as it goes.
//!
//! The exporter is also [`CopyCapable`]: given a [`CopySource`] it lets the
//! server render the CSV with `COPY (...) TO STDOUT` and streams the bytes
//! straight into the sink.

use tracing::debug;

use crate::cursor::{CopySource, Cursor};
use crate::error::{ExportError, Result, SinkError};
use crate::export::progress::ProgressTracker;
use crate::export::{CopyCapable, ExportOptions, Exporter};
use crate::formatter::{TextConverter, ValueConverter};
use crate::output::with_sink;

/// Writer for CSV format
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let delimiter = options.delimiter_byte()?;
        let converter = TextConverter::csv(options.time_context());
        let fields = cursor.field_descriptors().to_vec();

        debug!(
            "Preparing CSV export (delimiter={:?}, no_header={}, compression={})",
            options.delimiter, options.no_header, options.compression
        );

        with_sink(&options.sink_config(), |sink| {
            let mut writer = ::csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(sink);

            if !options.no_header {
                writer.write_record(fields.iter().map(|f| f.name.as_str()))?;
                debug!("CSV headers written: {} columns", fields.len());
            }

            let mut tracker = ProgressTracker::new("CSV", options.progress);
            let mut count = 0u64;
            while cursor.has_next() {
                let index = count + 1;
                let record = cursor
                    .values()
                    .map(|values| converter.convert_row(&values, &fields))
                    .map_err(|e| ExportError::at_row(index, e))?;
                writer
                    .write_record(&record)
                    .map_err(|e| ExportError::at_row(index, e.into()))?;
                count = index;

                if tracker.update(count) {
                    writer.flush().map_err(SinkError::Write)?;
                }
            }

            debug!("Flushing CSV buffers...");
            writer.flush().map_err(SinkError::Write)?;

            if let Some(err) = cursor.err() {
                return Err(err);
            }

            tracker.finish();
            Ok(count)
        })
    }

    fn as_copy_capable(&self) -> Option<&dyn CopyCapable> {
        Some(self)
    }
}

impl CopyCapable for CsvExporter {
    fn export_copy(
        &self,
        source: &mut dyn CopySource,
        query: &str,
        options: &ExportOptions,
    ) -> Result<u64> {
        options.validate()?;
        let sql = copy_statement(query, !options.no_header, options.delimiter);
        debug!(
            "Starting COPY export (no_header={}, compression={})",
            options.no_header, options.compression
        );

        let count = with_sink(&options.sink_config(), |sink| source.copy_out(&sql, sink))?;
        debug!("COPY export completed: {count} rows");
        Ok(count)
    }
}

/// `COPY (<query>) TO STDOUT WITH (FORMAT csv, HEADER <bool>, DELIMITER '<c>')`
pub fn copy_statement(query: &str, header: bool, delimiter: char) -> String {
    let delimiter = if delimiter == '\'' {
        "''".to_string()
    } else {
        delimiter.to_string()
    };
    format!(
        "COPY ({}) TO STDOUT WITH (FORMAT csv, HEADER {header}, DELIMITER '{delimiter}')",
        query.trim().trim_end_matches(';')
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;
    use crate::cursor::{FieldDescriptor, MemoryCursor, Value, WireType};
    use crate::export::writers::testing::{people, read_text};
    use crate::output::Compression;

    /// Replays canned COPY output and records the statement it was given.
    struct CannedCopy {
        payload: &'static [u8],
        rows: u64,
        statement: Option<String>,
    }

    impl CopySource for CannedCopy {
        fn copy_out(&mut self, sql: &str, out: &mut dyn Write) -> Result<u64> {
            self.statement = Some(sql.to_string());
            out.write_all(self.payload)?;
            Ok(self.rows)
        }
    }

    #[test]
    fn test_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions::new("csv", dir.path().join("people.csv"));

        let count = CsvExporter.export(&mut people(), &options).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            read_text(&dir.path().join("people.csv")),
            "id,name,joined\n1,alice,2024-01-15\n2,bob,\n"
        );
    }

    #[test]
    fn test_no_header_and_tab_delimiter() {
        let dir = TempDir::new().unwrap();
        let mut options = ExportOptions::new("csv", dir.path().join("people.tsv"));
        options.no_header = true;
        options.delimiter = '\t';

        CsvExporter.export(&mut people(), &options).unwrap();
        assert_eq!(
            read_text(&dir.path().join("people.tsv")),
            "1\talice\t2024-01-15\n2\tbob\t\n"
        );
    }

    #[test]
    fn test_values_needing_quotes() {
        let dir = TempDir::new().unwrap();
        let options = ExportOptions::new("csv", dir.path().join("q.csv"));
        let mut cursor = MemoryCursor::new(vec![FieldDescriptor::new("note", WireType::Text)])
            .with_row(vec![Value::from("a,b \"c\"")]);

        CsvExporter.export(&mut cursor, &options).unwrap();
        assert_eq!(
            read_text(&dir.path().join("q.csv")),
            "note\n\"a,b \"\"c\"\"\"\n"
        );
    }

    #[test]
    fn test_failing_row_leaves_closed_gzip() {
        let dir = TempDir::new().unwrap();
        let mut options = ExportOptions::new("csv", dir.path().join("partial.csv"));
        options.compression = Compression::Gzip;
        let mut cursor = people().with_failing_row("bad numeric");

        let err = CsvExporter.export(&mut cursor, &options).unwrap_err();
        assert!(matches!(err, ExportError::Row { index: 3, .. }));

        let mut decoded = String::new();
        std::io::Read::read_to_string(
            &mut flate2::read::GzDecoder::new(
                std::fs::File::open(dir.path().join("partial.csv.gz")).unwrap(),
            ),
            &mut decoded,
        )
        .unwrap();
        assert_eq!(decoded, "id,name,joined\n1,alice,2024-01-15\n2,bob,\n");
    }

    #[test]
    fn test_copy_statement() {
        assert_eq!(
            copy_statement("SELECT * FROM users;", true, ';'),
            "COPY (SELECT * FROM users) TO STDOUT WITH (FORMAT csv, HEADER true, DELIMITER ';')"
        );
        assert!(copy_statement("SELECT 1", false, '\'').ends_with("DELIMITER '''')"));
    }

    #[test]
    fn test_copy_count_matches_row_by_row() {
        let dir = TempDir::new().unwrap();
        let streamed = CsvExporter
            .export(
                &mut people(),
                &ExportOptions::new("csv", dir.path().join("rows.csv")),
            )
            .unwrap();

        let mut source = CannedCopy {
            payload: b"id,name,joined\n1,alice,2024-01-15\n2,bob,\n",
            rows: 2,
            statement: None,
        };
        let options = ExportOptions::new("csv", dir.path().join("copy.csv"));
        let copied = CsvExporter
            .as_copy_capable()
            .unwrap()
            .export_copy(&mut source, "SELECT * FROM people", &options)
            .unwrap();

        assert_eq!(copied, streamed);
        assert_eq!(
            read_text(&dir.path().join("copy.csv")),
            read_text(&dir.path().join("rows.csv"))
        );
        assert!(source.statement.unwrap().contains("HEADER true, DELIMITER ','"));
    }
}
