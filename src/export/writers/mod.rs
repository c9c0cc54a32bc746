//! Format writers
//!
//! One exporter per output format. They share the row loop in
//! [`drain_rows`], which numbers rows from 1, wraps any failure with that
//! index and checks the cursor's terminal error once iteration stops.

use crate::cursor::{Cursor, Value};
use crate::error::{ExportError, Result};

use super::progress::ProgressTracker;

pub mod csv;
pub mod json;
pub mod sql;
pub mod template;
pub mod xlsx;
pub mod xml;
pub mod yaml;

pub use csv::CsvExporter;
pub use json::JsonExporter;
pub use sql::SqlExporter;
pub use template::TemplateExporter;
pub use xlsx::XlsxExporter;
pub use xml::XmlExporter;
pub use yaml::YamlExporter;

/// Pull every row from `cursor` and hand it to `on_row`.
///
/// # Arguments
/// * `cursor` - Source rows
/// * `tracker` - Progress tracker updated after each row
/// * `on_row` - Called with the 1-based row index and the row's values
///
/// # Returns
/// * `Result<u64>` - Number of rows handled
pub(crate) fn drain_rows<F>(
    cursor: &mut dyn Cursor,
    tracker: &mut ProgressTracker,
    mut on_row: F,
) -> Result<u64>
where
    F: FnMut(u64, Vec<Value>) -> Result<()>,
{
    let mut count = 0u64;
    while cursor.has_next() {
        let index = count + 1;
        let values = cursor
            .values()
            .map_err(|e| ExportError::at_row(index, e))?;
        on_row(index, values).map_err(|e| ExportError::at_row(index, e))?;
        count = index;
        tracker.update(count);
    }

    if let Some(err) = cursor.err() {
        return Err(err);
    }
    Ok(count)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{FieldDescriptor, MemoryCursor, WireType};

    fn cursor() -> MemoryCursor {
        MemoryCursor::new(vec![FieldDescriptor::new("n", WireType::Int8)])
    }

    #[test]
    fn test_drain_counts_rows() {
        let mut cursor = cursor().with_rows(vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let mut tracker = ProgressTracker::new("test", false);
        let mut seen = Vec::new();
        let count = drain_rows(&mut cursor, &mut tracker, |index, values| {
            seen.push((index, values));
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen[1], (2, vec![Value::Int(2)]));
    }

    #[test]
    fn test_drain_wraps_failing_row() {
        let mut cursor = cursor()
            .with_row(vec![Value::Int(1)])
            .with_failing_row("broken");
        let mut tracker = ProgressTracker::new("test", false);
        let err = drain_rows(&mut cursor, &mut tracker, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, ExportError::Row { index: 2, .. }));
    }

    #[test]
    fn test_drain_reports_terminal_error() {
        let mut cursor = cursor()
            .with_row(vec![Value::Int(1)])
            .with_terminal_error("connection reset");
        let mut tracker = ProgressTracker::new("test", false);
        let err = drain_rows(&mut cursor, &mut tracker, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, ExportError::Cursor(_)));
    }
}
