//! SQL INSERT exporter
//!
//! Rows are grouped into batches of `rows_per_statement`, each written as one
//! multi-row statement:
//!
//! ```text
//! INSERT INTO "public"."users" ("id", "name") VALUES
//! 	(1, 'alice'),
//! 	(2, 'bob');
//! ```
//!
//! The last, possibly partial, batch is written after the cursor is
//! exhausted.

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::{SqlLiteralConverter, ValueConverter, quote_ident};
use crate::output::{OutputSink, with_sink};

use super::drain_rows;

/// Writer for SQL format
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlExporter;

impl Exporter for SqlExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let converter = SqlLiteralConverter::new(options.time_context());
        let fields = cursor.field_descriptors().to_vec();
        let batch_size = options.rows_per_statement.max(1);
        let prefix = insert_prefix(
            &options.table_name,
            fields.iter().map(|f| f.name.as_str()),
        );

        debug!(
            "Preparing SQL export (table={}, rows_per_statement={batch_size}, compression={})",
            options.table_name, options.compression
        );

        with_sink(&options.sink_config(), |sink| {
            let mut batch: Vec<Vec<String>> = Vec::with_capacity(batch_size);
            let mut statements = 0u64;

            let mut tracker = ProgressTracker::new("SQL", options.progress);
            let count = drain_rows(cursor, &mut tracker, |_, values| {
                batch.push(converter.convert_row(&values, &fields));
                if batch.len() == batch_size {
                    write_statement(sink, &prefix, &batch)?;
                    batch.clear();
                    statements += 1;
                }
                Ok(())
            })?;

            if !batch.is_empty() {
                write_statement(sink, &prefix, &batch)?;
                statements += 1;
            }

            debug!("{statements} INSERT statements written");
            tracker.finish();
            Ok(count)
        })
    }
}

/// `INSERT INTO <table> (<columns>) VALUES\n`
fn insert_prefix<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let columns: Vec<String> = columns.map(quote_column).collect();
    format!(
        "INSERT INTO {} ({}) VALUES\n",
        quote_ident(table.trim()),
        columns.join(", ")
    )
}

/// Column names are quoted whole; a dot inside one is part of the name.
fn quote_column(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn write_statement(sink: &mut OutputSink, prefix: &str, rows: &[Vec<String>]) -> Result<()> {
    let mut statement = String::with_capacity(prefix.len() + rows.len() * 64);
    statement.push_str(prefix);
    for (i, row) in rows.iter().enumerate() {
        let terminator = if i + 1 == rows.len() { ';' } else { ',' };
        statement.push_str("\t(");
        statement.push_str(&row.join(", "));
        statement.push(')');
        statement.push(terminator);
        statement.push('\n');
    }
    sink.emit(statement.as_bytes())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cursor::{FieldDescriptor, MemoryCursor, Value, WireType};
    use crate::export::writers::testing::{people, read_text};

    fn options(dir: &TempDir, name: &str, batch: usize) -> ExportOptions {
        let mut options = ExportOptions::new("sql", dir.path().join(name));
        options.table_name = "public.users".to_string();
        options.rows_per_statement = batch;
        options
    }

    fn numbers(n: i64) -> MemoryCursor {
        MemoryCursor::new(vec![FieldDescriptor::new("n", WireType::Int8)])
            .with_rows((1..=n).map(|i| vec![Value::Int(i)]))
    }

    #[test]
    fn test_single_row_statements() {
        let dir = TempDir::new().unwrap();
        let opts = options(&dir, "people.sql", 1);
        SqlExporter.export(&mut people(), &opts).unwrap();

        assert_eq!(
            read_text(&opts.output_path),
            concat!(
                "INSERT INTO \"public\".\"users\" (\"id\", \"name\", \"joined\") VALUES\n",
                "\t(1, 'alice', '2024-01-15'::date);\n",
                "INSERT INTO \"public\".\"users\" (\"id\", \"name\", \"joined\") VALUES\n",
                "\t(2, 'bob', NULL);\n"
            )
        );
    }

    #[test]
    fn test_batches_and_final_partial_batch() {
        let dir = TempDir::new().unwrap();
        let opts = options(&dir, "numbers.sql", 3);
        let count = SqlExporter.export(&mut numbers(7), &opts).unwrap();
        assert_eq!(count, 7);

        let text = read_text(&opts.output_path);
        let statements: Vec<&str> = text
            .split("INSERT INTO")
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(statements.len(), 3);

        let rows_per_statement: Vec<usize> = statements
            .iter()
            .map(|s| s.lines().filter(|l| l.starts_with('\t')).count())
            .collect();
        assert_eq!(rows_per_statement, vec![3, 3, 1]);

        for statement in statements {
            let rows: Vec<&str> = statement.lines().filter(|l| l.starts_with('\t')).collect();
            let (last, rest) = rows.split_last().unwrap();
            assert!(last.ends_with(';'));
            assert!(rest.iter().all(|l| l.ends_with(',')));
        }
    }

    #[test]
    fn test_exact_multiple_has_no_empty_statement() {
        let dir = TempDir::new().unwrap();
        let opts = options(&dir, "six.sql", 3);
        SqlExporter.export(&mut numbers(6), &opts).unwrap();
        assert_eq!(read_text(&opts.output_path).matches("INSERT INTO").count(), 2);
    }

    #[test]
    fn test_missing_table_is_rejected_before_output() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir, "none.sql", 1);
        opts.table_name = String::new();
        let err = SqlExporter.export(&mut numbers(1), &opts).unwrap_err();
        assert!(err.is_config());
        assert!(!opts.output_path.exists());
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_column("weird\"col.x"), "\"weird\"\"col.x\"");
        assert_eq!(
            insert_prefix("t", ["a", "b"].into_iter()),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES\n"
        );
    }
}
