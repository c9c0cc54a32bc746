//! In-memory cursor

use std::collections::VecDeque;

use super::{Cursor, FieldDescriptor, Value};
use crate::error::{ExportError, Result};

/// Cursor over rows held in memory.
///
/// Individual rows can be made to fail on decode, and a terminal error can be
/// reported once the rows are exhausted, which makes it convenient for
/// exercising error paths.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    fields: Vec<FieldDescriptor>,
    rows: VecDeque<Result<Vec<Value>>>,
    current: Option<Result<Vec<Value>>>,
    terminal: Option<ExportError>,
}

impl MemoryCursor {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    /// Append a row. Its length must match the number of fields.
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push_back(Ok(row));
        self
    }

    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.rows.extend(rows.into_iter().map(Ok));
        self
    }

    /// Append a row whose decode fails with `message`.
    pub fn with_failing_row(mut self, message: &str) -> Self {
        self.rows
            .push_back(Err(ExportError::Value(message.to_string())));
        self
    }

    /// Report `message` from [`Cursor::err`] after the last row.
    pub fn with_terminal_error(mut self, message: &str) -> Self {
        self.terminal = Some(ExportError::Cursor(message.to_string()));
        self
    }

    /// Number of rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Cursor for MemoryCursor {
    fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn has_next(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn values(&mut self) -> Result<Vec<Value>> {
        match self.current.take() {
            Some(Ok(row)) if row.len() != self.fields.len() => Err(ExportError::Value(format!(
                "row has {} values but {} columns were described",
                row.len(),
                self.fields.len()
            ))),
            Some(row) => row,
            None => Err(ExportError::Cursor(
                "values requested without a current row".to_string(),
            )),
        }
    }

    fn err(&mut self) -> Option<ExportError> {
        self.terminal.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::WireType;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", WireType::Int4),
            FieldDescriptor::new("name", WireType::Text),
        ]
    }

    #[test]
    fn test_iterates_rows_in_order() {
        let mut cursor = MemoryCursor::new(fields())
            .with_row(vec![Value::Int(1), "a".into()])
            .with_row(vec![Value::Int(2), "b".into()]);

        let mut ids = Vec::new();
        while cursor.has_next() {
            let row = cursor.values().unwrap();
            ids.push(row[0].clone());
        }
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);
        assert!(cursor.err().is_none());
        assert_eq!(cursor.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_failing_row_and_terminal_error() {
        let mut cursor = MemoryCursor::new(fields())
            .with_failing_row("boom")
            .with_terminal_error("connection reset");

        assert!(cursor.has_next());
        assert!(cursor.values().is_err());
        assert!(!cursor.has_next());
        assert!(matches!(cursor.err(), Some(ExportError::Cursor(_))));
        assert!(cursor.err().is_none());
    }

    #[test]
    fn test_row_width_mismatch() {
        let mut cursor = MemoryCursor::new(fields()).with_row(vec![Value::Int(1)]);
        assert!(cursor.has_next());
        assert!(cursor.values().is_err());
    }
}
