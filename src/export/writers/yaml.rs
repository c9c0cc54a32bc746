//! YAML exporter
//!
//! Every row becomes a mapping appended to one sequence, and the sequence is
//! serialized once after the cursor is exhausted. The whole result is held
//! in memory until then.

use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::cursor::Cursor;
use crate::encoder::{OrderedRow, encode_yaml_row};
use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::YamlConverter;
use crate::output::with_sink;

use super::drain_rows;

/// Writer for YAML format
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlExporter;

impl Exporter for YamlExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let converter = YamlConverter::new(options.time_context());
        let fields = cursor.field_descriptors().to_vec();

        debug!("Preparing YAML export (compression={})", options.compression);

        with_sink(&options.sink_config(), |sink| {
            let mut sequence = Vec::new();
            let mut tracker = ProgressTracker::new("YAML", options.progress);
            let count = drain_rows(cursor, &mut tracker, |_, values| {
                let row = OrderedRow::build(&fields, &values, &converter);
                sequence.push(encode_yaml_row(&row));
                Ok(())
            })?;

            debug!("Encoding {count} YAML rows...");
            serde_yaml::to_writer(&mut *sink, &YamlValue::Sequence(sequence))?;
            tracker.finish();
            Ok(count)
        })
    }
}
