use serde_json::{Map, Value};

/// One row as delivered by a data source: field name to value.
pub type Record = Map<String, Value>;

/// Text shown in a cell and written to CSV. Null and missing values render empty.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}
