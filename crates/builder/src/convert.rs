//! Row cell -> typed [`Value`] conversion per a [`PropertyType`] (§6).

use lpg_core::Value;
use lpg_metadata_loader::PropertyType;

use crate::error::{BuildError, BuildResult};

/// An empty cell always converts to `Value::Null`, regardless of declared
/// type; this matches the missing-value handling every entity in the
/// corpus relies on (a blank CSV cell is absence, not a zero).
pub fn convert(raw: &str, field: &str, property_type: PropertyType) -> BuildResult<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    let fail = |type_name: &str| BuildError::TypeConversion {
        field: field.to_string(),
        field_type: type_name.to_string(),
        value: raw.to_string(),
    };
    match property_type {
        PropertyType::Integer => raw.trim().parse::<i64>().map(Value::Int).map_err(|_| fail("integer")),
        PropertyType::Float => raw.trim().parse::<f64>().map(Value::Float).map_err(|_| fail("float")),
        PropertyType::String => Ok(Value::String(raw.to_string())),
        PropertyType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(fail("boolean")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_is_null_regardless_of_type() {
        assert_eq!(convert("", "x", PropertyType::Integer).unwrap(), Value::Null);
        assert_eq!(convert("", "x", PropertyType::Boolean).unwrap(), Value::Null);
    }

    #[test]
    fn parses_each_declared_type() {
        assert_eq!(convert("42", "x", PropertyType::Integer).unwrap(), Value::Int(42));
        assert_eq!(convert("3.5", "x", PropertyType::Float).unwrap(), Value::Float(3.5));
        assert_eq!(convert("hi", "x", PropertyType::String).unwrap(), Value::String("hi".into()));
        assert_eq!(convert("true", "x", PropertyType::Boolean).unwrap(), Value::Bool(true));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(convert("abc", "x", PropertyType::Integer).is_err());
        assert!(convert("maybe", "x", PropertyType::Boolean).is_err());
    }
}
