//! Purpose: Tagged row values exchanged with stores and the codec.
//! Exports: `Value`, `Row`.
//! Role: Boundary type between loosely typed store data and fixed-width binary slots.
//! Invariants: Coercions never fail; unrepresentable input becomes the type's zero/empty value.
//! Invariants: Text is trimmed before numeric parsing.
use std::collections::BTreeMap;
use std::fmt;

use serde_json::json;

use crate::core::schema::{ScalarType, TableDefinition};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Byte(u8),
    Short(i16),
    Int(i32),
    UInt(u32),
    Long(i64),
    Float(f32),
    String(String),
    StringArray(Vec<String>),
}

impl Value {
    pub fn default_for(scalar_type: ScalarType) -> Self {
        match scalar_type {
            ScalarType::Byte => Value::Byte(0),
            ScalarType::Short => Value::Short(0),
            ScalarType::Int => Value::Int(0),
            ScalarType::UInt => Value::UInt(0),
            ScalarType::Long => Value::Long(0),
            ScalarType::Float => Value::Float(0.0),
            ScalarType::String => Value::String(String::new()),
        }
    }

    /// Parse store text into the value for `scalar_type`, defaulting on failure.
    pub fn coerce(&self, scalar_type: ScalarType) -> Value {
        match scalar_type {
            ScalarType::Byte => Value::Byte(self.to_u8()),
            ScalarType::Short => Value::Short(self.to_i16()),
            ScalarType::Int => Value::Int(self.to_i32()),
            ScalarType::UInt => Value::UInt(self.to_u32()),
            ScalarType::Long => Value::Long(self.to_i64()),
            ScalarType::Float => Value::Float(self.to_f32()),
            ScalarType::String => Value::String(self.to_text().trim().to_string()),
        }
    }

    pub fn to_u8(&self) -> u8 {
        self.integer()
            .and_then(|value| u8::try_from(value).ok())
            .unwrap_or_default()
    }

    pub fn to_i16(&self) -> i16 {
        self.integer()
            .and_then(|value| i16::try_from(value).ok())
            .unwrap_or_default()
    }

    pub fn to_i32(&self) -> i32 {
        self.integer()
            .and_then(|value| i32::try_from(value).ok())
            .unwrap_or_default()
    }

    pub fn to_u32(&self) -> u32 {
        self.integer()
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or_default()
    }

    pub fn to_i64(&self) -> i64 {
        self.integer()
            .and_then(|value| i64::try_from(value).ok())
            .unwrap_or_default()
    }

    pub fn to_f32(&self) -> f32 {
        match self {
            Value::Byte(value) => f32::from(*value),
            Value::Short(value) => f32::from(*value),
            Value::Int(value) => *value as f32,
            Value::UInt(value) => *value as f32,
            Value::Long(value) => *value as f32,
            Value::Float(value) => *value,
            Value::String(text) => text.trim().parse().unwrap_or_default(),
            Value::StringArray(items) => items
                .first()
                .and_then(|text| text.trim().parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Text form of a scalar; an array contributes its first element.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(text) => text.clone(),
            Value::StringArray(items) => items.first().cloned().unwrap_or_default(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Byte(value) => json!(value),
            Value::Short(value) => json!(value),
            Value::Int(value) => json!(value),
            Value::UInt(value) => json!(value),
            Value::Long(value) => json!(value),
            Value::Float(value) => json!(value),
            Value::String(text) => json!(text),
            Value::StringArray(items) => json!(items),
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Value::Byte(value) => Some(i128::from(*value)),
            Value::Short(value) => Some(i128::from(*value)),
            Value::Int(value) => Some(i128::from(*value)),
            Value::UInt(value) => Some(i128::from(*value)),
            Value::Long(value) => Some(i128::from(*value)),
            Value::Float(value) => {
                (value.is_finite() && value.fract() == 0.0).then_some(*value as i128)
            }
            Value::String(text) => text.trim().parse().ok(),
            Value::StringArray(items) => items.first().and_then(|text| text.trim().parse().ok()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(value) => write!(f, "{value}"),
            Value::Short(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::UInt(value) => write!(f, "{value}"),
            Value::Long(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::String(text) => f.write_str(text),
            Value::StringArray(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringArray(value)
    }
}

/// Field name to value mapping; array fields hold a `StringArray`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Regroup flattened column values (schema order) into a row.
    pub fn from_positional(table: &TableDefinition, values: &[Value]) -> Self {
        let mut row = Row::new();
        let mut cursor = values.iter();
        for field in &table.fields {
            if field.is_array() {
                let items = cursor
                    .by_ref()
                    .take(field.slots() as usize)
                    .map(Value::to_text)
                    .collect::<Vec<_>>();
                row.insert(field.name.clone(), Value::StringArray(items));
            } else if let Some(value) = cursor.next() {
                row.insert(field.name.clone(), value.clone());
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::{Row, Value};
    use crate::core::schema::{ContainerKind, FieldDefinition, ScalarType, TableDefinition};

    #[test]
    fn text_is_trimmed_and_parsed() {
        assert_eq!(Value::from(" 42 ").to_i32(), 42);
        assert_eq!(Value::from("+7").to_i16(), 7);
        assert_eq!(Value::from("2.5").to_f32(), 2.5);
    }

    #[test]
    fn unparseable_or_out_of_range_input_defaults_to_zero() {
        assert_eq!(Value::from("abc").to_i32(), 0);
        assert_eq!(Value::from("").to_i64(), 0);
        assert_eq!(Value::from("300").to_u8(), 0);
        assert_eq!(Value::from("-1").to_u32(), 0);
        assert_eq!(Value::from("1.5").to_i32(), 0);
        assert_eq!(Value::Long(i64::MAX).to_i32(), 0);
        assert_eq!(Value::from("fast").to_f32(), 0.0);
    }

    #[test]
    fn typed_values_convert_between_widths() {
        assert_eq!(Value::Int(200).to_u8(), 200);
        assert_eq!(Value::Float(3.0).to_i64(), 3);
        assert_eq!(Value::UInt(u32::MAX).to_u32(), u32::MAX);
        assert_eq!(Value::Short(-2).to_f32(), -2.0);
    }

    #[test]
    fn coerce_produces_the_field_type() {
        assert_eq!(Value::from("12").coerce(ScalarType::Short), Value::Short(12));
        assert_eq!(
            Value::from("  name ").coerce(ScalarType::String),
            Value::String("name".to_string())
        );
        assert_eq!(Value::from("x").coerce(ScalarType::Long), Value::Long(0));
    }

    #[test]
    fn scalar_reads_take_first_array_element() {
        let value = Value::StringArray(vec!["5".to_string(), "6".to_string()]);
        assert_eq!(value.to_i32(), 5);
        assert_eq!(value.to_text(), "5");
    }

    #[test]
    fn positional_values_regroup_into_arrays() {
        let table = TableDefinition::new(
            "T",
            ContainerKind::Legacy,
            vec![
                FieldDefinition::scalar("ID", ScalarType::Int),
                FieldDefinition::array("Tag", ScalarType::String, 2),
            ],
        );
        let values = vec![Value::Int(1), Value::from("a"), Value::from("b")];
        let row = Row::from_positional(&table, &values);
        assert_eq!(row.get("ID"), Some(&Value::Int(1)));
        assert_eq!(
            row.get("Tag"),
            Some(&Value::StringArray(vec!["a".to_string(), "b".to_string()]))
        );
    }
}
