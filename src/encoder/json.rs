//! Ordered JSON object encoding
//!
//! Objects are emitted by hand so keys keep column order:
//!
//! ```text
//! {
//!     "id": 1,
//!     "tags": ["a","b"]
//!   }
//! ```
//!
//! The closing brace is indented for an object placed two spaces deep in the
//! surrounding array.

use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::OrderedRow;
use crate::error::Result;

/// Indentation of a row's members.
const MEMBER_INDENT: &str = "    ";

/// Encode one row as a JSON object.
///
/// Empty rows encode as `{}`. Nested objects are pretty-printed and
/// re-indented under their key; other values are compact. `<`, `>` and `&`
/// are not escaped.
pub fn encode_json_row(row: &OrderedRow<JsonValue>) -> Result<Vec<u8>> {
    if row.is_empty() {
        return Ok(b"{}".to_vec());
    }

    let mut out = Vec::with_capacity(row.len() * 32);
    out.extend_from_slice(b"{\n");

    for (i, (key, value)) in row.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b",\n");
        }
        out.extend_from_slice(MEMBER_INDENT.as_bytes());
        serde_json::to_writer(&mut out, key)?;
        out.extend_from_slice(b": ");
        write_value(&mut out, value)?;
    }

    out.extend_from_slice(b"\n  }");
    Ok(out)
}

fn write_value(out: &mut Vec<u8>, value: &JsonValue) -> Result<()> {
    match value {
        JsonValue::Object(map) if !map.is_empty() => {
            let mut pretty = Vec::new();
            let mut ser = Serializer::with_formatter(&mut pretty, PrettyFormatter::with_indent(b"  "));
            value.serialize(&mut ser)?;

            for (i, line) in pretty.split(|&b| b == b'\n').enumerate() {
                if i > 0 {
                    out.push(b'\n');
                    out.extend_from_slice(MEMBER_INDENT.as_bytes());
                }
                out.extend_from_slice(line);
            }
            Ok(())
        }
        other => Ok(serde_json::to_writer(out, other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(pairs: Vec<(&str, JsonValue)>) -> String {
        let mut row = OrderedRow::default();
        for (k, v) in pairs {
            row.push(k, v);
        }
        String::from_utf8(encode_json_row(&row).unwrap()).unwrap()
    }

    #[test]
    fn test_keys_in_column_order() {
        let out = encode(vec![("z", json!(1)), ("a", json!("x")), ("m", JsonValue::Null)]);
        assert_eq!(out, "{\n    \"z\": 1,\n    \"a\": \"x\",\n    \"m\": null\n  }");
    }

    #[test]
    fn test_empty_row() {
        assert_eq!(encode(vec![]), "{}");
    }

    #[test]
    fn test_no_html_escaping() {
        let out = encode(vec![("html", json!("<a href=\"x\">&</a>"))]);
        assert!(out.contains("\"<a href=\\\"x\\\">&</a>\""));
    }

    #[test]
    fn test_nested_object_reindented() {
        let out = encode(vec![("doc", json!({"k": 1}))]);
        assert_eq!(out, "{\n    \"doc\": {\n      \"k\": 1\n    }\n  }");
    }

    #[test]
    fn test_arrays_compact() {
        let out = encode(vec![("tags", json!(["a", "b"]))]);
        assert_eq!(out, "{\n    \"tags\": [\"a\",\"b\"]\n  }");
    }

    #[test]
    fn test_duplicate_column_names_emit_one_key() {
        let out = encode(vec![("id", json!(1)), ("name", json!("a")), ("id", json!(2))]);
        assert_eq!(out, "{\n    \"id\": 2,\n    \"name\": \"a\"\n  }");
    }
}
