//! NDJSON replay cursor
//!
//! Replays a result set captured as newline-delimited JSON:
//!
//! ```text
//! {"columns":[{"name":"id","type":"int4"},{"name":"created","type":"timestamptz"}]}
//! [1,"2024-03-01T10:00:00Z"]
//! [2,null]
//! ```
//!
//! The first line describes the columns (`type` is a type name or a numeric
//! OID); every following non-empty line is one row encoded as a JSON array.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{Cursor, FieldDescriptor, Interval, Value, WireType};
use crate::error::{ExportError, Result};

#[derive(Debug, Deserialize)]
struct Header {
    columns: Vec<ColumnSpec>,
}

#[derive(Debug, Deserialize)]
struct ColumnSpec {
    name: String,
    #[serde(rename = "type")]
    type_ref: JsonValue,
}

impl ColumnSpec {
    fn wire_type(&self) -> Result<WireType> {
        match &self.type_ref {
            JsonValue::String(name) => Ok(WireType::from_name(name)),
            JsonValue::Number(n) => n
                .as_u64()
                .and_then(|oid| u32::try_from(oid).ok())
                .map(WireType::from_oid)
                .ok_or_else(|| ExportError::Value(format!("invalid type OID {n}"))),
            other => Err(ExportError::Value(format!(
                "column '{}' has invalid type {other}",
                self.name
            ))),
        }
    }
}

/// Cursor replaying an NDJSON capture.
pub struct ReplayCursor<R> {
    reader: R,
    fields: Vec<FieldDescriptor>,
    line: String,
    line_no: usize,
    terminal: Option<ExportError>,
}

impl ReplayCursor<BufReader<File>> {
    /// Open a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!("Replaying rows from {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: BufRead> ReplayCursor<R> {
    /// Read the column header from `reader`.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let mut first = String::new();
        let mut line_no = 0;
        while first.trim().is_empty() {
            first.clear();
            if reader.read_line(&mut first)? == 0 {
                return Err(ExportError::Value(
                    "replay input is empty, expected a column header".to_string(),
                ));
            }
            line_no += 1;
        }

        let header: Header = serde_json::from_str(first.trim())?;
        let fields = header
            .columns
            .iter()
            .map(|c| Ok(FieldDescriptor::new(c.name.clone(), c.wire_type()?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            reader,
            fields,
            line: String::new(),
            line_no,
            terminal: None,
        })
    }
}

impl<R: BufRead> Cursor for ReplayCursor<R> {
    fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn has_next(&mut self) -> bool {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return false,
                Ok(_) => {
                    self.line_no += 1;
                    if !self.line.trim().is_empty() {
                        return true;
                    }
                }
                Err(e) => {
                    self.terminal = Some(e.into());
                    return false;
                }
            }
        }
    }

    fn values(&mut self) -> Result<Vec<Value>> {
        let raw: Vec<JsonValue> = serde_json::from_str(self.line.trim()).map_err(|e| {
            ExportError::Value(format!("line {}: {e}", self.line_no))
        })?;

        if raw.len() != self.fields.len() {
            return Err(ExportError::Value(format!(
                "line {}: expected {} values, found {}",
                self.line_no,
                self.fields.len(),
                raw.len()
            )));
        }

        raw.into_iter()
            .zip(&self.fields)
            .map(|(json, field)| {
                decode(json, &field.wire_type).map_err(|e| {
                    ExportError::Value(format!("line {} column '{}': {e}", self.line_no, field.name))
                })
            })
            .collect()
    }

    fn err(&mut self) -> Option<ExportError> {
        self.terminal.take()
    }
}

/// Decode one JSON-encoded value into the shape its wire type declares.
pub fn decode(json: JsonValue, wire: &WireType) -> Result<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }

    let mismatch = |json: &JsonValue| ExportError::Value(format!("cannot read {json} as {wire:?}"));

    match wire {
        WireType::Bool => match &json {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::String(s) => match s.as_str() {
                "t" | "true" => Ok(Value::Bool(true)),
                "f" | "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&json)),
            },
            _ => Err(mismatch(&json)),
        },
        WireType::Int2 | WireType::Int4 | WireType::Int8 => match &json {
            JsonValue::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| mismatch(&json)),
            JsonValue::String(s) => s.parse().map(Value::Int).map_err(|_| mismatch(&json)),
            _ => Err(mismatch(&json)),
        },
        WireType::Float4 | WireType::Float8 => match &json {
            JsonValue::Number(n) => n.as_f64().map(Value::Float).ok_or_else(|| mismatch(&json)),
            JsonValue::String(s) => s.parse().map(Value::Float).map_err(|_| mismatch(&json)),
            _ => Err(mismatch(&json)),
        },
        WireType::Numeric => match json {
            JsonValue::Number(n) => Ok(Value::Numeric(n.to_string())),
            JsonValue::String(s) => Ok(Value::Numeric(s)),
            other => Err(mismatch(&other)),
        },
        WireType::Text | WireType::Varchar | WireType::Bpchar => match json {
            JsonValue::String(s) => Ok(Value::Text(s)),
            other => Ok(Value::Text(other.to_string())),
        },
        WireType::Date => text(&json)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(Value::Date)
            .ok_or_else(|| mismatch(&json)),
        WireType::Timestamp => text(&json)
            .and_then(parse_naive_timestamp)
            .map(Value::Timestamp)
            .ok_or_else(|| mismatch(&json)),
        WireType::Timestamptz => text(&json)
            .and_then(parse_zoned_timestamp)
            .map(Value::TimestampTz)
            .ok_or_else(|| mismatch(&json)),
        WireType::Uuid => text(&json)
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(|u| Value::Uuid(*u.as_bytes()))
            .ok_or_else(|| mismatch(&json)),
        WireType::Bytea => match json {
            JsonValue::String(s) => match s.strip_prefix("\\x") {
                Some(hex_part) => hex::decode(hex_part)
                    .map(Value::Bytes)
                    .map_err(|e| ExportError::Value(format!("invalid bytea hex: {e}"))),
                None => Ok(Value::Bytes(s.into_bytes())),
            },
            other => Err(mismatch(&other)),
        },
        WireType::Interval => match &json {
            JsonValue::Object(map) => {
                let part = |key: &str| map.get(key).and_then(JsonValue::as_i64).unwrap_or(0);
                Ok(Value::Interval(Interval {
                    months: i32::try_from(part("months")).map_err(|_| mismatch(&json))?,
                    days: i32::try_from(part("days")).map_err(|_| mismatch(&json))?,
                    microseconds: part("microseconds"),
                }))
            }
            _ => Err(mismatch(&json)),
        },
        WireType::Json | WireType::Jsonb => Ok(Value::Json(json)),
        WireType::Array(elem) => match json {
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| decode(item, elem))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch(&other)),
        },
        WireType::Other(_) => Ok(untyped(json)),
    }
}

fn text(json: &JsonValue) -> Option<&str> {
    json.as_str()
}

fn parse_naive_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn parse_zoned_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn untyped(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Value::Text(s),
        JsonValue::Array(items) => Value::Array(items.into_iter().map(untyped).collect()),
        object @ JsonValue::Object(_) => Value::Json(object),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::io::Cursor as IoCursor;

    fn replay(input: &str) -> ReplayCursor<IoCursor<Vec<u8>>> {
        ReplayCursor::from_reader(IoCursor::new(input.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let mut cursor = replay(
            "{\"columns\":[{\"name\":\"id\",\"type\":\"int4\"},{\"name\":\"at\",\"type\":1184}]}\n\
             [1,\"2024-03-01T10:00:00Z\"]\n\
             \n\
             [2,null]\n",
        );

        assert_eq!(cursor.column_names(), vec!["id", "at"]);
        assert_eq!(cursor.field_descriptors()[1].wire_type, WireType::Timestamptz);

        assert!(cursor.has_next());
        let row = cursor.values().unwrap();
        assert_eq!(row[0], Value::Int(1));
        assert_eq!(
            row[1],
            Value::TimestampTz(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );

        assert!(cursor.has_next());
        assert_eq!(cursor.values().unwrap()[1], Value::Null);
        assert!(!cursor.has_next());
        assert!(cursor.err().is_none());
    }

    #[test]
    fn test_bad_row_is_a_value_error() {
        let mut cursor = replay("{\"columns\":[{\"name\":\"id\",\"type\":\"int8\"}]}\n[\"x\"]\n[1,2]\n");
        assert!(cursor.has_next());
        assert!(matches!(cursor.values(), Err(ExportError::Value(_))));
        assert!(cursor.has_next());
        assert!(cursor.values().is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = ReplayCursor::from_reader(IoCursor::new(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_typed_values() {
        assert_eq!(
            decode(json!("\\x6869"), &WireType::Bytea).unwrap(),
            Value::Bytes(b"hi".to_vec())
        );
        assert_eq!(
            decode(json!("12.50"), &WireType::Numeric).unwrap(),
            Value::Numeric("12.50".to_string())
        );
        assert_eq!(
            decode(json!({"months": 1, "days": 2, "microseconds": 3}), &WireType::Interval).unwrap(),
            Value::Interval(Interval {
                months: 1,
                days: 2,
                microseconds: 3
            })
        );
        assert_eq!(
            decode(json!(["a", null]), &WireType::Array(Box::new(WireType::Text))).unwrap(),
            Value::Array(vec![Value::Text("a".to_string()), Value::Null])
        );
        assert_eq!(
            decode(json!("2024-01-02 03:04:05.5"), &WireType::Timestamp).unwrap(),
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_milli_opt(3, 4, 5, 500)
                    .unwrap()
            )
        );
        assert!(decode(json!("not-a-date"), &WireType::Date).is_err());
    }
}
