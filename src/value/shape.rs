use super::Value;
use std::fmt;

/// Structural kind of a state value.
///
/// A key's shape is decided once, from its initial value, and selects the
/// extra operations the key's handler exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Array,
    Object,
    Boolean,
    /// Anything else: numbers, strings and null.
    Opaque,
}

impl Shape {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Shape::Array,
            Value::Object(_) => Shape::Object,
            Value::Bool(_) => Shape::Boolean,
            Value::Null | Value::Number(_) | Value::String(_) => Shape::Opaque,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Array => "array",
            Shape::Object => "object",
            Shape::Boolean => "boolean",
            Shape::Opaque => "opaque",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_values() {
        assert_eq!(Shape::of(&Value::from(json!([1]))), Shape::Array);
        assert_eq!(Shape::of(&Value::from(json!({}))), Shape::Object);
        assert_eq!(Shape::of(&Value::from(false)), Shape::Boolean);
        assert_eq!(Shape::of(&Value::from(1)), Shape::Opaque);
        assert_eq!(Shape::of(&Value::from("s")), Shape::Opaque);
        assert_eq!(Shape::of(&Value::Null), Shape::Opaque);
    }
}
