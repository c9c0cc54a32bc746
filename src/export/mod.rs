//! Per-format exporters
//!
//! An [`Exporter`] consumes a [`Cursor`] and writes every row to one output
//! sink in its format, returning the number of rows written. Exporters are
//! looked up by name in a [`Registry`] filled once at startup by
//! [`register_builtin_exporters`].
//!
//! # Architecture
//!
//! ```text
//! Cursor -> ValueConverter -> OrderedRow / record -> format writer -> OutputSink
//! ```
//!
//! 1. **ExportOptions**: immutable settings for one call, validated up front
//! 2. **ProgressTracker**: periodic checkpoints and an optional spinner
//! 3. **writers**: one exporter per format
//!
//! Every exporter opens exactly one sink and closes it exactly once, even
//! when a row fails. Row failures carry the 1-based index of the row.

use crate::cursor::{CopySource, Cursor};
use crate::error::Result;

pub mod options;
pub mod progress;
pub mod registry;
pub mod writers;

pub use options::{
    ExportOptions, FORMAT_CSV, FORMAT_JSON, FORMAT_SQL, FORMAT_TEMPLATE, FORMAT_XLSX, FORMAT_XML,
    FORMAT_YAML,
};
pub use progress::ProgressTracker;
pub use registry::{Registry, register_builtin_exporters};
pub use writers::{
    CsvExporter, JsonExporter, SqlExporter, TemplateExporter, XlsxExporter, XmlExporter,
    YamlExporter,
};

/// Writes the rows of a cursor in one output format.
pub trait Exporter {
    /// Export every row of `cursor` according to `options`.
    ///
    /// # Arguments
    /// * `cursor` - Source rows, consumed to exhaustion
    /// * `options` - Settings for this export
    ///
    /// # Returns
    /// * `Result<u64>` - Number of rows written
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64>;

    /// Server-side COPY support, if this format has it.
    fn as_copy_capable(&self) -> Option<&dyn CopyCapable> {
        None
    }
}

/// Exporters that can let the database server produce the output directly.
pub trait CopyCapable {
    /// Run `query` through `COPY ... TO STDOUT` and stream the result into
    /// the sink.
    ///
    /// # Returns
    /// * `Result<u64>` - Row count reported by the server
    fn export_copy(
        &self,
        source: &mut dyn CopySource,
        query: &str,
        options: &ExportOptions,
    ) -> Result<u64>;
}
