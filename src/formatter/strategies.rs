//! Converter strategies, one per output family
//!
//! - TextConverter: CSV and XML text
//! - JsonConverter / YamlConverter: structured nodes
//! - SqlLiteralConverter: SQL literals
//! - CellConverter: spreadsheet cells
//! - TemplateConverter: template engine values

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use super::converter::ValueConverter;
use super::{Formatted, TimeContext, format_by_type, format_float, round_significant, uuid_text};
use crate::cursor::{Value, WireType};

/// Plain text for delimited and markup formats.
///
/// NULL becomes the empty string. JSON documents are serialized compactly;
/// when that fails the configured fallback is used (`{}` for CSV, the empty
/// string for XML).
#[derive(Debug, Clone)]
pub struct TextConverter {
    time: TimeContext,
    json_fallback: &'static str,
}

impl TextConverter {
    pub fn csv(time: TimeContext) -> Self {
        Self {
            time,
            json_fallback: "{}",
        }
    }

    pub fn xml(time: TimeContext) -> Self {
        Self {
            time,
            json_fallback: "",
        }
    }
}

impl ValueConverter for TextConverter {
    type Output = String;

    fn convert(&self, value: &Value, wire: &WireType) -> String {
        format_by_type(value, wire, &self.time).to_text(self.json_fallback)
    }
}

/// `serde_json` nodes for the JSON encoder.
#[derive(Debug, Clone)]
pub struct JsonConverter {
    time: TimeContext,
}

impl JsonConverter {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }
}

impl ValueConverter for JsonConverter {
    type Output = JsonValue;

    fn convert(&self, value: &Value, wire: &WireType) -> JsonValue {
        format_by_type(value, wire, &self.time).to_json()
    }
}

/// `serde_yaml` nodes for the YAML encoder.
#[derive(Debug, Clone)]
pub struct YamlConverter {
    time: TimeContext,
}

impl YamlConverter {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }

    fn to_yaml(formatted: &Formatted) -> serde_yaml::Value {
        match formatted {
            Formatted::Null => serde_yaml::Value::Null,
            Formatted::Bool(b) => serde_yaml::Value::Bool(*b),
            Formatted::Int(n) => serde_yaml::Value::Number((*n).into()),
            Formatted::Float(f) => serde_yaml::Value::Number(round_significant(*f).into()),
            Formatted::Text(s) => serde_yaml::Value::String(s.clone()),
            Formatted::Json(v) => serde_yaml::to_value(v).unwrap_or(serde_yaml::Value::Null),
            Formatted::Array(items) => {
                serde_yaml::Value::Sequence(items.iter().map(Self::to_yaml).collect())
            }
        }
    }
}

impl ValueConverter for YamlConverter {
    type Output = serde_yaml::Value;

    fn convert(&self, value: &Value, wire: &WireType) -> serde_yaml::Value {
        Self::to_yaml(&format_by_type(value, wire, &self.time))
    }
}

/// SQL literals for INSERT statements.
///
/// Temporal, UUID, bytea, interval and JSON values carry an explicit cast.
/// Timestamps with time zone are written in UTC.
#[derive(Debug, Clone)]
pub struct SqlLiteralConverter {
    time: TimeContext,
}

impl SqlLiteralConverter {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }

    fn json_literal(value: &Value, cast: &str) -> String {
        let text = match value {
            Value::Json(v) => serde_json::to_string(v).ok(),
            Value::Text(s) if serde_json::from_str::<JsonValue>(s).is_ok() => Some(s.clone()),
            Value::Text(s) => serde_json::to_string(s).ok(),
            _ => None,
        };
        match text {
            Some(text) => format!("{}::{cast}", quote_literal(&text)),
            None => format!("'{{}}'::{cast}"),
        }
    }

    fn generic(&self, value: &Value, wire: &WireType) -> String {
        match value {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(b) => b.to_string(),
            _ => match format_by_type(value, wire, &self.time) {
                Formatted::Null => "NULL".to_string(),
                formatted => quote_literal(&formatted.to_text("{}")),
            },
        }
    }
}

impl ValueConverter for SqlLiteralConverter {
    type Output = String;

    fn convert(&self, value: &Value, wire: &WireType) -> String {
        match (wire, value) {
            (_, Value::Null) => "NULL".to_string(),
            (WireType::Date, Value::Date(d)) => format!("'{}'::date", d.format("%Y-%m-%d")),
            (WireType::Timestamp, Value::Timestamp(ts)) => {
                format!("'{}'::timestamp", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
            }
            (WireType::Timestamptz, Value::TimestampTz(ts)) => {
                format!("'{}+00'::timestamptz", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
            }
            (WireType::Uuid, Value::Uuid(bytes)) => format!("'{}'::uuid", uuid_text(bytes)),
            (WireType::Bytea, Value::Bytes(bytes)) => {
                format!("{}::bytea", quote_literal(&String::from_utf8_lossy(bytes)))
            }
            (WireType::Bool, Value::Bool(b)) => b.to_string(),
            (WireType::Numeric, Value::Numeric(s)) => match s.trim().parse::<f64>() {
                Ok(f) => format_float(f),
                Err(_) => "NULL".to_string(),
            },
            (WireType::Interval, Value::Interval(iv)) => format!("'{iv}'::interval"),
            (WireType::Jsonb, v) => Self::json_literal(v, "jsonb"),
            (WireType::Json, v) => Self::json_literal(v, "json"),
            _ => self.generic(value, wire),
        }
    }
}

/// Single-quote a string literal, doubling embedded quotes.
fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote a possibly schema-qualified identifier.
///
/// Each dot-separated part is wrapped in double quotes with embedded double
/// quotes doubled: `public.users` becomes `"public"."users"`.
pub fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Spreadsheet cell content.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// Spreadsheet cells.
///
/// Dates and timestamps stay native so the spreadsheet can apply its own
/// number format; timestamps with time zone are converted to the resolved
/// zone first. JSON documents and arrays are written as JSON text.
#[derive(Debug, Clone)]
pub struct CellConverter {
    time: TimeContext,
}

impl CellConverter {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }
}

impl ValueConverter for CellConverter {
    type Output = Cell;

    fn convert(&self, value: &Value, wire: &WireType) -> Cell {
        match (wire, value) {
            (_, Value::Null) => Cell::Blank,
            (WireType::Date, Value::Date(d)) => Cell::Date(*d),
            (WireType::Timestamp, Value::Timestamp(ts)) => Cell::DateTime(*ts),
            (WireType::Timestamptz, Value::TimestampTz(ts)) => {
                Cell::DateTime(self.time.localize(ts))
            }
            _ => match format_by_type(value, wire, &self.time) {
                Formatted::Null => Cell::Blank,
                Formatted::Bool(b) => Cell::Bool(b),
                Formatted::Int(n) => Cell::Number(n as f64),
                Formatted::Float(f) => Cell::Number(f),
                Formatted::Text(s) => Cell::Text(s),
                Formatted::Json(v) => Cell::Text(
                    serde_json::to_string(&v).unwrap_or_else(|_| "{}".to_string()),
                ),
                array @ Formatted::Array(_) => Cell::Text(
                    serde_json::to_string(&array.to_json()).unwrap_or_else(|_| "[]".to_string()),
                ),
            },
        }
    }
}

/// Template engine values.
///
/// JSON documents and arrays are exposed as compact JSON text; NULL becomes
/// `none`.
#[derive(Debug, Clone)]
pub struct TemplateConverter {
    time: TimeContext,
}

impl TemplateConverter {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }
}

impl ValueConverter for TemplateConverter {
    type Output = minijinja::Value;

    fn convert(&self, value: &Value, wire: &WireType) -> minijinja::Value {
        match format_by_type(value, wire, &self.time) {
            Formatted::Null => minijinja::Value::from(()),
            Formatted::Bool(b) => minijinja::Value::from(b),
            Formatted::Int(n) => minijinja::Value::from(n),
            Formatted::Float(f) => minijinja::Value::from(f),
            Formatted::Text(s) => minijinja::Value::from(s),
            Formatted::Json(v) => minijinja::Value::from(
                serde_json::to_string(&v).unwrap_or_else(|_| "{}".to_string()),
            ),
            array @ Formatted::Array(_) => minijinja::Value::from(
                serde_json::to_string(&array.to_json()).unwrap_or_else(|_| "[]".to_string()),
            ),
        }
    }
}
