//! XML exporter
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <results>
//!   <row>
//!     <id>1</id>
//!     <note></note>
//!   </row>
//! </results>
//! ```
//!
//! Root and row tags come from the options; one child element per column.
//! Values that look like JSON documents (leading `{` or `[`) are written
//! verbatim, everything else is escaped.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::{TextConverter, ValueConverter};
use crate::output::with_sink;

use super::drain_rows;

/// Writer for XML format
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlExporter;

impl Exporter for XmlExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let converter = TextConverter::xml(options.time_context());
        let fields = cursor.field_descriptors().to_vec();
        let root = options.xml_root_tag.trim();
        let row_tag = options.xml_row_tag.trim();

        debug!(
            "Preparing XML export (root=<{root}>, row=<{row_tag}>, compression={})",
            options.compression
        );

        with_sink(&options.sink_config(), |sink| {
            let count = {
                let mut writer = Writer::new_with_indent(&mut *sink, b' ', 2);
                writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
                writer.write_event(Event::Start(BytesStart::new(root)))?;

                let mut tracker = ProgressTracker::new("XML", options.progress);
                let count = drain_rows(cursor, &mut tracker, |_, values| {
                    writer.write_event(Event::Start(BytesStart::new(row_tag)))?;
                    for (field, text) in fields.iter().zip(converter.convert_row(&values, &fields)) {
                        write_column(&mut writer, &field.name, &text)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(row_tag)))?;
                    Ok(())
                })?;

                writer.write_event(Event::End(BytesEnd::new(root)))?;
                tracker.finish();
                count
            };

            sink.emit(b"\n")?;
            Ok(count)
        })
    }
}

fn write_column<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    let body = if text.starts_with('{') || text.starts_with('[') {
        BytesText::from_escaped(text)
    } else {
        BytesText::new(text)
    };
    // An empty text event keeps the closing tag on the same line.
    writer.write_event(Event::Text(body))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cursor::{FieldDescriptor, MemoryCursor, Value, WireType};
    use crate::export::writers::testing::{people, read_text};

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.xml");
        let count = XmlExporter
            .export(&mut people(), &ExportOptions::new("xml", &path))
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            read_text(&path),
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<results>\n",
                "  <row>\n",
                "    <id>1</id>\n",
                "    <name>alice</name>\n",
                "    <joined>2024-01-15</joined>\n",
                "  </row>\n",
                "  <row>\n",
                "    <id>2</id>\n",
                "    <name>bob</name>\n",
                "    <joined></joined>\n",
                "  </row>\n",
                "</results>\n"
            )
        );
    }

    #[test]
    fn test_custom_tags_escaping_and_raw_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.xml");
        let mut options = ExportOptions::new("xml", &path);
        options.xml_root_tag = "users".to_string();
        options.xml_row_tag = "user".to_string();

        let mut cursor = MemoryCursor::new(vec![
            FieldDescriptor::new("bio", WireType::Text),
            FieldDescriptor::new("meta", WireType::Json),
        ])
        .with_row(vec![
            Value::from("a < b & c"),
            Value::Json(serde_json::json!({"tags": ["x"]})),
        ]);

        XmlExporter.export(&mut cursor, &options).unwrap();
        let text = read_text(&path);
        assert!(text.contains("<users>"));
        assert!(text.contains("  <user>"));
        assert!(text.contains("<bio>a &lt; b &amp; c</bio>"));
        assert!(text.contains("<meta>{\"tags\":[\"x\"]}</meta>"));
    }
}
