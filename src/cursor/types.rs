//! Wire types and raw values as delivered by the driver

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// PostgreSQL column type, keyed by type OID.
///
/// Types the formatter has dedicated handling for get their own variant;
/// everything else is carried through as [`WireType::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Varchar,
    Bpchar,
    Date,
    Timestamp,
    Timestamptz,
    Uuid,
    Bytea,
    Interval,
    Json,
    Jsonb,
    /// One-dimensional array of the element type.
    Array(Box<WireType>),
    Other(u32),
}

/// OIDs of the scalar types with a dedicated variant, paired with the OID of
/// their array type.
const TYPE_OIDS: &[(WireType, u32, u32)] = &[
    (WireType::Bool, 16, 1000),
    (WireType::Bytea, 17, 1001),
    (WireType::Int8, 20, 1016),
    (WireType::Int2, 21, 1005),
    (WireType::Int4, 23, 1007),
    (WireType::Text, 25, 1009),
    (WireType::Json, 114, 199),
    (WireType::Float4, 700, 1021),
    (WireType::Float8, 701, 1022),
    (WireType::Bpchar, 1042, 1014),
    (WireType::Varchar, 1043, 1015),
    (WireType::Date, 1082, 1182),
    (WireType::Timestamp, 1114, 1115),
    (WireType::Timestamptz, 1184, 1185),
    (WireType::Interval, 1186, 1187),
    (WireType::Numeric, 1700, 1231),
    (WireType::Uuid, 2950, 2951),
    (WireType::Jsonb, 3802, 3807),
];

impl WireType {
    /// Resolve a type OID.
    pub fn from_oid(oid: u32) -> Self {
        for (ty, scalar, array) in TYPE_OIDS {
            if *scalar == oid {
                return ty.clone();
            }
            if *array == oid {
                return WireType::Array(Box::new(ty.clone()));
            }
        }
        WireType::Other(oid)
    }

    /// OID of this type.
    pub fn oid(&self) -> u32 {
        match self {
            WireType::Other(oid) => *oid,
            WireType::Array(elem) => TYPE_OIDS
                .iter()
                .find(|(ty, _, _)| ty == elem.as_ref())
                .map(|(_, _, array)| *array)
                .unwrap_or(0),
            scalar => TYPE_OIDS
                .iter()
                .find(|(ty, _, _)| ty == scalar)
                .map(|(_, oid, _)| *oid)
                .unwrap_or(0),
        }
    }

    /// Resolve a type name as printed by `format_type` or `pg_type.typname`.
    ///
    /// Array types are accepted both as `text[]` and `_text`. A purely
    /// numeric name is treated as an OID.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();

        if let Ok(oid) = name.parse::<u32>() {
            return Self::from_oid(oid);
        }
        if let Some(elem) = name.strip_suffix("[]") {
            return WireType::Array(Box::new(Self::from_name(elem)));
        }
        if let Some(elem) = name.strip_prefix('_') {
            return WireType::Array(Box::new(Self::from_name(elem)));
        }

        match name.as_str() {
            "bool" | "boolean" => WireType::Bool,
            "int2" | "smallint" => WireType::Int2,
            "int4" | "int" | "integer" => WireType::Int4,
            "int8" | "bigint" => WireType::Int8,
            "float4" | "real" => WireType::Float4,
            "float8" | "double precision" => WireType::Float8,
            "numeric" | "decimal" => WireType::Numeric,
            "text" => WireType::Text,
            "varchar" | "character varying" => WireType::Varchar,
            "bpchar" | "char" | "character" => WireType::Bpchar,
            "date" => WireType::Date,
            "timestamp" | "timestamp without time zone" => WireType::Timestamp,
            "timestamptz" | "timestamp with time zone" => WireType::Timestamptz,
            "uuid" => WireType::Uuid,
            "bytea" => WireType::Bytea,
            "interval" => WireType::Interval,
            "json" => WireType::Json,
            "jsonb" => WireType::Jsonb,
            _ => WireType::Other(0),
        }
    }
}

/// PostgreSQL interval as three independent components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl fmt::Display for Interval {
    /// Renders `[N mon ][N day ]HH:MM:SS.ffffff`, with a leading `-` on the
    /// clock part when the time component is negative.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months != 0 {
            write!(f, "{} mon ", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{} day ", self.days)?;
        }

        let mut micros = self.microseconds;
        if micros < 0 {
            micros = -micros;
            f.write_str("-")?;
        }
        let hours = micros / 3_600_000_000;
        micros %= 3_600_000_000;
        let minutes = micros / 60_000_000;
        micros %= 60_000_000;
        let seconds = micros / 1_000_000;
        micros %= 1_000_000;

        write!(f, "{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}

/// Raw column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary-precision decimal in its textual form.
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Uuid([u8; 16]),
    Interval(Interval),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_oid_scalars_and_arrays() {
        assert_eq!(WireType::from_oid(1082), WireType::Date);
        assert_eq!(WireType::from_oid(3802), WireType::Jsonb);
        assert_eq!(
            WireType::from_oid(1009),
            WireType::Array(Box::new(WireType::Text))
        );
        assert_eq!(WireType::from_oid(869), WireType::Other(869));
    }

    #[test]
    fn test_oid_matches_from_oid() {
        for oid in [16, 20, 1043, 1184, 2950, 1007, 3807] {
            assert_eq!(WireType::from_oid(oid).oid(), oid);
        }
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(WireType::from_name("INTEGER"), WireType::Int4);
        assert_eq!(
            WireType::from_name("timestamp with time zone"),
            WireType::Timestamptz
        );
        assert_eq!(
            WireType::from_name("int4[]"),
            WireType::Array(Box::new(WireType::Int4))
        );
        assert_eq!(
            WireType::from_name("_uuid"),
            WireType::Array(Box::new(WireType::Uuid))
        );
        assert_eq!(WireType::from_name("1700"), WireType::Numeric);
        assert_eq!(WireType::from_name("inet"), WireType::Other(0));
    }

    #[test]
    fn test_interval_display() {
        let iv = Interval {
            months: 1,
            days: 2,
            microseconds: 3 * 3_600_000_000 + 4 * 60_000_000 + 5_000_000,
        };
        assert_eq!(iv.to_string(), "1 mon 2 day 03:04:05.000000");

        let negative = Interval {
            months: 0,
            days: 0,
            microseconds: -1_500_000,
        };
        assert_eq!(negative.to_string(), "-00:00:01.500000");
        assert_eq!(Interval::default().to_string(), "00:00:00.000000");
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }
}
