//! Order-preserving row encoders
//!
//! Rows are assembled as an [`OrderedRow`]: an explicit sequence of
//! `(column, value)` pairs plus a lookup index. Encoders iterate the pairs,
//! never a hash map, so every output reproduces the cursor's column order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cursor::{FieldDescriptor, Value};
use crate::formatter::ValueConverter;

pub mod json;
pub mod yaml;

pub use json::encode_json_row;
pub use yaml::encode_yaml_row;

/// Column/value pairs in column order with keyed lookup.
///
/// A repeated column name keeps the position of its first occurrence and
/// takes the value of the last one.
#[derive(Debug, Clone)]
pub struct OrderedRow<V> {
    pairs: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> OrderedRow<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Convert one cursor row with `converter`.
    pub fn build<C>(fields: &[FieldDescriptor], values: &[Value], converter: &C) -> Self
    where
        C: ValueConverter<Output = V>,
    {
        let mut row = Self::with_capacity(fields.len());
        for (field, value) in fields.iter().zip(values) {
            row.push(field.name.clone(), converter.convert(value, &field.wire_type));
        }
        row
    }

    pub fn push(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&position) = self.index.get(&key) {
            self.pairs[position].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.pairs.len());
        self.pairs.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.pairs[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<V> Default for OrderedRow<V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Exposes a row to templates as a map whose keys enumerate in column order.
impl minijinja::value::Object for OrderedRow<minijinja::Value> {
    fn repr(self: &Arc<Self>) -> minijinja::value::ObjectRepr {
        minijinja::value::ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &minijinja::Value) -> Option<minijinja::Value> {
        key.as_str().and_then(|k| self.get(k)).cloned()
    }

    fn enumerate(self: &Arc<Self>) -> minijinja::value::Enumerator {
        minijinja::value::Enumerator::Values(self.keys().map(minijinja::Value::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::WireType;
    use crate::formatter::{TextConverter, TimeContext};

    #[test]
    fn test_push_preserves_order() {
        let mut row = OrderedRow::default();
        row.push("zeta", 1);
        row.push("alpha", 2);
        row.push("mid", 3);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(row.get("alpha"), Some(&2));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let mut row = OrderedRow::default();
        row.push("id", 1);
        row.push("name", 5);
        row.push("id", 2);
        assert_eq!(row.len(), 2);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(row.get("id"), Some(&2));
    }

    #[test]
    fn test_build_from_cursor_row() {
        let fields = vec![
            FieldDescriptor::new("b", WireType::Int4),
            FieldDescriptor::new("a", WireType::Text),
        ];
        let conv = TextConverter::csv(TimeContext::default());
        let row = OrderedRow::build(&fields, &[Value::Int(9), Value::Null], &conv);
        let pairs: Vec<_> = row.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![("b".to_string(), "9".to_string()), ("a".to_string(), String::new())]
        );
    }

    #[test]
    fn test_template_object_enumerates_in_order() {
        let mut row = OrderedRow::default();
        row.push("second", minijinja::Value::from(2));
        row.push("first", minijinja::Value::from(1));
        let value = minijinja::Value::from_object(row);

        let env = minijinja::Environment::new();
        let out = env
            .render_str("{% for k in row %}{{ k }}={{ row[k] }};{% endfor %}", minijinja::context! { row => value })
            .unwrap();
        assert_eq!(out, "second=2;first=1;");
    }
}
