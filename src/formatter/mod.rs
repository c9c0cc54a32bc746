//! Type-driven value formatting
//!
//! Every raw value goes through [`format_by_type`], which dispatches on the
//! column's [`WireType`] and produces a [`Formatted`] intermediate. Output
//! formats then convert that intermediate (or, for SQL and XLSX, the raw
//! value) into their own representation through a [`ValueConverter`]
//! strategy:
//!
//! - [`TextConverter`]: CSV and XML text
//! - [`JsonConverter`]: `serde_json` nodes
//! - [`YamlConverter`]: `serde_yaml` nodes
//! - [`SqlLiteralConverter`]: SQL literals with type casts
//! - [`CellConverter`]: spreadsheet cells with native dates
//! - [`TemplateConverter`]: template engine values

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::cursor::{Value, WireType};

mod converter;
mod layout;
mod numeric;
mod strategies;

pub use converter::ValueConverter;
pub use layout::{TimeLayout, extract_date_layout};
pub use numeric::{format_float, round_significant};
pub use strategies::{
    Cell, CellConverter, JsonConverter, SqlLiteralConverter, TemplateConverter, TextConverter,
    YamlConverter, quote_ident,
};

/// Default time layout.
pub const DEFAULT_TIME_LAYOUT: &str = "yyyy-MM-dd HH:mm:ss";

/// Zone timestamps with time zone are converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Named(Tz),
}

/// Time layout and zone resolved once per export.
#[derive(Debug, Clone)]
pub struct TimeContext {
    layout: TimeLayout,
    date_layout: TimeLayout,
    zone: Zone,
}

impl TimeContext {
    /// Resolve a user layout and IANA zone name.
    ///
    /// An empty zone selects the local zone. An unknown zone also falls back
    /// to the local zone, with a warning.
    pub fn resolve(layout: &str, zone: &str) -> Self {
        let zone = zone.trim();
        let zone = if zone.is_empty() {
            Zone::Local
        } else {
            match zone.parse::<Tz>() {
                Ok(tz) => Zone::Named(tz),
                Err(e) => {
                    warn!("Invalid timezone {zone:?}, using local time: {e}");
                    Zone::Local
                }
            }
        };

        Self {
            layout: TimeLayout::parse(layout),
            date_layout: TimeLayout::parse(&extract_date_layout(layout)),
            zone,
        }
    }

    pub fn layout(&self) -> &TimeLayout {
        &self.layout
    }

    pub fn date_layout(&self) -> &TimeLayout {
        &self.date_layout
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        self.date_layout.render(&date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn format_timestamp(&self, ts: &NaiveDateTime) -> String {
        self.layout.render(ts)
    }

    pub fn format_timestamptz(&self, ts: &DateTime<Utc>) -> String {
        self.layout.render(&self.localize(ts))
    }

    /// Wall-clock time of `ts` in the resolved zone.
    pub fn localize(&self, ts: &DateTime<Utc>) -> NaiveDateTime {
        match self.zone {
            Zone::Local => ts.with_timezone(&chrono::Local).naive_local(),
            Zone::Named(tz) => ts.with_timezone(&tz).naive_local(),
        }
    }
}

impl Default for TimeContext {
    fn default() -> Self {
        Self::resolve(DEFAULT_TIME_LAYOUT, "")
    }
}

/// Format-neutral result of [`format_by_type`].
#[derive(Debug, Clone, PartialEq)]
pub enum Formatted {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(JsonValue),
    Array(Vec<Formatted>),
}

impl Formatted {
    /// Plain text rendering used by delimited and markup formats.
    ///
    /// JSON documents are serialized compactly, falling back to
    /// `json_fallback` if that fails. Arrays render as `{a,b}` with `NULL`
    /// for null elements.
    pub fn to_text(&self, json_fallback: &str) -> String {
        match self {
            Formatted::Null => String::new(),
            Formatted::Bool(b) => b.to_string(),
            Formatted::Int(n) => n.to_string(),
            Formatted::Float(f) => format_float(*f),
            Formatted::Text(s) => s.clone(),
            Formatted::Json(v) => {
                serde_json::to_string(v).unwrap_or_else(|_| json_fallback.to_string())
            }
            Formatted::Array(items) => {
                let elems: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Formatted::Null => "NULL".to_string(),
                        other => other.to_text(json_fallback),
                    })
                    .collect();
                format!("{{{}}}", elems.join(","))
            }
        }
    }

    /// JSON node; floats are rounded to 15 significant digits and non-finite
    /// floats become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Formatted::Null => JsonValue::Null,
            Formatted::Bool(b) => JsonValue::Bool(*b),
            Formatted::Int(n) => JsonValue::from(*n),
            Formatted::Float(f) => serde_json::Number::from_f64(round_significant(*f))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Formatted::Text(s) => JsonValue::String(s.clone()),
            Formatted::Json(v) => v.clone(),
            Formatted::Array(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

/// Convert a raw value according to its column type.
///
/// - DATE renders with the date portion of the layout only
/// - TIMESTAMP renders with the full layout, no zone conversion
/// - TIMESTAMPTZ is converted to the resolved zone first
/// - NUMERIC becomes a float, or null when it cannot be represented
/// - UUID renders as lower-case hyphenated hex
/// - BYTEA is decoded as (lossy) UTF-8 text
/// - INTERVAL renders in PostgreSQL's textual form
/// - JSON and JSONB stay structured
///
/// Anything else passes through with the closest neutral representation.
pub fn format_by_type(value: &Value, wire: &WireType, time: &TimeContext) -> Formatted {
    match (wire, value) {
        (_, Value::Null) => Formatted::Null,
        (WireType::Date, Value::Date(d)) => Formatted::Text(time.format_date(*d)),
        (WireType::Date, Value::Timestamp(ts)) => Formatted::Text(time.format_date(ts.date())),
        (WireType::Timestamp, Value::Timestamp(ts)) => {
            Formatted::Text(time.format_timestamp(ts))
        }
        (WireType::Timestamptz, Value::TimestampTz(ts)) => {
            Formatted::Text(time.format_timestamptz(ts))
        }
        (WireType::Timestamptz, Value::Timestamp(ts)) => {
            Formatted::Text(time.format_timestamptz(&ts.and_utc()))
        }
        (WireType::Numeric, Value::Numeric(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Formatted::Float(f),
            Err(_) => Formatted::Null,
        },
        (WireType::Numeric, Value::Int(n)) => Formatted::Float(*n as f64),
        (WireType::Json | WireType::Jsonb, Value::Text(s)) => serde_json::from_str(s)
            .map(Formatted::Json)
            .unwrap_or_else(|_| Formatted::Text(s.clone())),
        (WireType::Array(elem), Value::Array(items)) => Formatted::Array(
            items
                .iter()
                .map(|item| format_by_type(item, elem, time))
                .collect(),
        ),
        _ => passthrough(value, time),
    }
}

fn passthrough(value: &Value, time: &TimeContext) -> Formatted {
    match value {
        Value::Null => Formatted::Null,
        Value::Bool(b) => Formatted::Bool(*b),
        Value::Int(n) => Formatted::Int(*n),
        Value::Float(f) => Formatted::Float(*f),
        Value::Numeric(s) | Value::Text(s) => Formatted::Text(s.clone()),
        Value::Bytes(b) => Formatted::Text(String::from_utf8_lossy(b).into_owned()),
        Value::Date(d) => Formatted::Text(time.format_date(*d)),
        Value::Timestamp(ts) => Formatted::Text(time.format_timestamp(ts)),
        Value::TimestampTz(ts) => Formatted::Text(time.format_timestamptz(ts)),
        Value::Uuid(bytes) => Formatted::Text(uuid_text(bytes)),
        Value::Interval(iv) => Formatted::Text(iv.to_string()),
        Value::Json(v) => Formatted::Json(v.clone()),
        Value::Array(items) => {
            Formatted::Array(items.iter().map(|item| passthrough(item, time)).collect())
        }
    }
}

/// Lower-case hyphenated form of a 16-byte UUID.
pub fn uuid_text(bytes: &[u8; 16]) -> String {
    uuid::Uuid::from_bytes(*bytes).hyphenated().to_string()
}
