//! Ordered YAML mapping encoding

use serde_yaml::{Mapping, Value as YamlValue};

use super::OrderedRow;

/// Build a mapping node for one row, keys in column order.
pub fn encode_yaml_row(row: &OrderedRow<YamlValue>) -> YamlValue {
    let mut mapping = Mapping::with_capacity(row.len());
    for (key, value) in row.iter() {
        mapping.insert(YamlValue::String(key.to_string()), value.clone());
    }
    YamlValue::Mapping(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_keeps_column_order() {
        let mut row = OrderedRow::default();
        row.push("zeta", YamlValue::Number(1i64.into()));
        row.push("alpha", YamlValue::Null);
        let node = encode_yaml_row(&row);

        let text = serde_yaml::to_string(&node).unwrap();
        assert_eq!(text, "zeta: 1\nalpha: null\n");
    }
}
