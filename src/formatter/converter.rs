//! Core converter trait for per-format value conversion

use crate::cursor::{FieldDescriptor, Value, WireType};

/// Conversion of a raw column value into one output format's representation.
///
/// Implementations own the [`TimeContext`](super::TimeContext) they were
/// built with, so a converter is created once per export and reused for
/// every row.
pub trait ValueConverter {
    /// Output type of the conversion
    type Output;

    /// Convert one value of a column with the given wire type.
    ///
    /// # Arguments
    /// * `value` - Raw value from the cursor
    /// * `wire` - Column type
    ///
    /// # Returns
    /// Converted value in the target format
    fn convert(&self, value: &Value, wire: &WireType) -> Self::Output;

    /// Convert a whole row, preserving column order.
    fn convert_row(&self, values: &[Value], fields: &[FieldDescriptor]) -> Vec<Self::Output> {
        values
            .iter()
            .zip(fields)
            .map(|(value, field)| self.convert(value, &field.wire_type))
            .collect()
    }
}
