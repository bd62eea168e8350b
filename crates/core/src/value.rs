//! The dynamic value type carried by node and edge property maps.

use serde::{Deserialize, Serialize};

/// A single property value.
///
/// Untagged on the wire: a schema-declared `integer` column round-trips as a
/// JSON number, a `string` column as a JSON string, and so on. Arithmetic
/// between variants promotes integer to float rather than failing; a `null`
/// operand propagates to a `null` result instead of raising an error (the
/// evaluator leans on this so a single missing upstream value degrades a
/// computation gracefully instead of aborting a rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// ISO-8601 timestamp, stored as its canonical string form.
    Timestamp(String),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Timestamp(s) | Value::String(s) => !s.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Timestamp(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by arithmetic. Returns `None` for values that are
    /// not numbers and are not null; callers decide whether that is an error
    /// or should itself propagate as null (see `lpg-expr-lang`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// `true` if the value is an integer with no fractional component,
    /// i.e. the result of an arithmetic op that never saw a float operand.
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Equality after numeric coercion: `Int(2) == Float(2.0)`, and numeric
    /// strings compare equal to their parsed number. Cross-type comparisons
    /// that cannot be coerced (e.g. `Bool` vs `String`) are unequal.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(s), Value::Int(i)) | (Value::Int(i), Value::String(s)) => {
                s.parse::<i64>().ok() == Some(*i)
            }
            (Value::String(s), Value::Float(f)) | (Value::Float(f), Value::String(s)) => {
                s.parse::<f64>().ok() == Some(*f)
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Timestamp(s) | Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Display form used when a value is interpolated into an id template or
    /// printed for a report; never quotes strings.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Timestamp(s) | Value::String(s) => s.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::String("".into()).is_truthy());
    }

    #[test]
    fn loose_equals_cross_type_numeric() {
        assert!(Value::Int(2).loose_equals(&Value::Float(2.0)));
        assert!(Value::String("42".into()).loose_equals(&Value::Int(42)));
        assert!(!Value::Bool(true).loose_equals(&Value::Int(1)));
    }

    #[test]
    fn ordering_promotes_int_to_float() {
        assert!(Value::Float(5.0) > Value::Int(3));
        assert!(Value::Int(5) > Value::Float(3.0));
    }

    #[test]
    fn json_roundtrip_for_scalars() {
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Int(7),
            Value::Float(1.5),
            Value::String("hi".into()),
        ] {
            let json = v.to_json();
            let back: Value = serde_json::from_value(json).unwrap();
            assert_eq!(v, back);
        }
    }
}
