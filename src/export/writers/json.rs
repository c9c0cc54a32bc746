//! JSON exporter
//!
//! Streams a top-level array: `[`, each row object indented two spaces and
//! separated by `,\n`, then `]`. Only one row is held in memory at a time.

use tracing::debug;

use crate::cursor::Cursor;
use crate::encoder::{OrderedRow, encode_json_row};
use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::JsonConverter;
use crate::output::with_sink;

use super::drain_rows;

/// Writer for JSON format
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let converter = JsonConverter::new(options.time_context());
        let fields = cursor.field_descriptors().to_vec();

        debug!(
            "Preparing JSON export (indent=2 spaces, compression={})",
            options.compression
        );

        with_sink(&options.sink_config(), |sink| {
            sink.emit(b"[\n")?;

            let mut tracker = ProgressTracker::new("JSON", options.progress);
            let count = drain_rows(cursor, &mut tracker, |index, values| {
                let row = OrderedRow::build(&fields, &values, &converter);
                let bytes = encode_json_row(&row)?;
                if index > 1 {
                    sink.emit(b",\n")?;
                }
                sink.emit(b"  ")?;
                sink.emit(&bytes)
            })?;

            sink.emit(b"\n]\n")?;
            tracker.finish();
            Ok(count)
        })
    }
}
