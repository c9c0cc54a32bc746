//! Row sources consumed by the exporters
//!
//! Exporters never talk to a database directly. They pull rows from a
//! [`Cursor`], a forward-only, single-pass iterator over one result set whose
//! column layout is described up front by [`FieldDescriptor`]s. The COPY fast
//! path additionally needs a [`CopySource`], a raw handle able to stream a
//! server-side `COPY ... TO STDOUT` into a writer.
//!
//! Two cursors ship with the crate:
//! - [`MemoryCursor`]: rows held in memory, used by tests and embedders
//! - [`ReplayCursor`]: rows replayed from an NDJSON capture of a result set

use std::io::Write;

use crate::error::{ExportError, Result};

pub mod memory;
pub mod replay;
pub mod types;

pub use memory::MemoryCursor;
pub use replay::ReplayCursor;
pub use types::{Interval, Value, WireType};

/// Column name and wire type of one projected column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub wire_type: WireType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            name: name.into(),
            wire_type,
        }
    }
}

/// Forward-only result set.
///
/// The call protocol is `has_next()` followed by `values()` for every row,
/// and `err()` once after `has_next()` first returns `false`.
pub trait Cursor {
    /// Column layout, fixed for the lifetime of the cursor.
    fn field_descriptors(&self) -> &[FieldDescriptor];

    /// Advance to the next row. Returns `false` on exhaustion or failure.
    fn has_next(&mut self) -> bool;

    /// Decode the current row, aligned 1:1 with [`Cursor::field_descriptors`].
    fn values(&mut self) -> Result<Vec<Value>>;

    /// Terminal error that stopped iteration, if any.
    fn err(&mut self) -> Option<ExportError>;

    /// Column names in order.
    fn column_names(&self) -> Vec<String> {
        self.field_descriptors()
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }
}

/// Raw connection handle able to run `COPY ... TO STDOUT`.
pub trait CopySource {
    /// Run `sql` and stream the server's output into `out`.
    ///
    /// # Returns
    /// * `Result<u64>` - Number of rows reported by the server
    fn copy_out(&mut self, sql: &str, out: &mut dyn Write) -> Result<u64>;
}
