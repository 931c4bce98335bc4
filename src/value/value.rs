use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Entries of an object value.
pub type Map = BTreeMap<String, Value>;

/// An immutable, cheaply cloneable value.
///
/// Cloning a `Value` never copies container contents; it only bumps a
/// reference count. Use [`Value::deep_clone`] when an independent copy is
/// needed.
///
/// `PartialEq` compares contents recursively. Reference identity is
/// available through [`Value::same`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    /// Build an array value from its items.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object value from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// An object with no entries.
    pub fn empty_object() -> Self {
        Value::Object(Arc::new(Map::new()))
    }

    /// Reference or primitive equality.
    ///
    /// Scalars compare by content, containers by allocation. This is the
    /// per-entry comparison used by [`shallow_equal`](crate::value::shallow_equal).
    ///
    /// Numbers compare by numeric value, so `1` and `1.0` are the same, while
    /// `0.0` and `-0.0` are not.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_number(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Copy every container into a fresh allocation.
    ///
    /// The result is equal to `self` but shares no container with it.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(items) => {
                Value::Array(Arc::new(items.iter().map(Value::deep_clone).collect()))
            }
            Value::Object(map) => Value::Object(Arc::new(
                map.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect(),
            )),
            Value::String(s) => Value::String(Arc::from(&**s)),
            scalar => scalar.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(&**map),
            _ => None,
        }
    }

    /// Look up a field of an object value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(field))
    }

    /// Look up an item of an array value.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Follow a dot-separated path of object fields.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |value, field| value.get(field))
    }
}

fn same_number(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.to_bits() == y.to_bits(),
            _ => false,
        }
    } else {
        a == b
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => serializer.collect_seq(items.iter()),
            Value::Object(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_shares_containers() {
        let value = Value::from(json!({"a": [1, 2]}));
        let copy = value.clone();
        assert!(value.same(&copy));
        assert_eq!(value, copy);
    }

    #[test]
    fn deep_clone_is_equal_but_not_same() {
        let value = Value::from(json!({"a": {"b": [1, 2]}}));
        let copy = value.deep_clone();
        assert_eq!(value, copy);
        assert!(!value.same(&copy));
        assert!(!value.get("a").unwrap().same(copy.get("a").unwrap()));
    }

    #[test]
    fn scalars_are_same_by_content() {
        assert!(Value::from(3).same(&Value::from(3)));
        assert!(Value::from("x").same(&Value::from("x")));
        assert!(!Value::from(3).same(&Value::from("3")));
        assert!(!Value::array([1]).same(&Value::array([1])));
    }

    #[test]
    fn numbers_are_same_by_numeric_value() {
        assert!(Value::from(1).same(&Value::from(1.0)));
        assert!(Value::from(1.0).same(&Value::from(1u8)));
        assert!(!Value::from(0.0).same(&Value::from(-0.0)));
        assert!(!Value::from(0).same(&Value::from(-0.0)));
        assert!(Value::from(u64::MAX).same(&Value::from(u64::MAX)));
        assert!(!Value::from(1).same(&Value::from(2.5)));
    }

    #[test]
    fn json_interop() {
        let json = json!({"count": 0, "list": [1, 2], "flags": {"a": true}});
        let value = Value::from(json.clone());
        assert_eq!(serde_json::Value::from(&value), json);
        assert_eq!(serde_json::to_value(&value).unwrap(), json);

        let parsed: Value = serde_json::from_str(r#"{"x":[true,null]}"#).unwrap();
        assert_eq!(parsed.pointer("x").and_then(|x| x.at(0)), Some(&Value::Bool(true)));
        assert_eq!(parsed.to_string(), r#"{"x":[true,null]}"#);
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
    }
}
