use crate::error::{Result, StoreError};
use crate::value::Value;
use serde::{Serialize, Serializer};

/// An ordered mapping from key to value.
///
/// Keys keep their insertion order. Once a bag is handed to a store its key
/// set is frozen: the store only ever replaces values of existing keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateBag {
    entries: Vec<(String, Value)>,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.index_of(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Build a bag from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(StoreError::InvalidState(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index_of(key).map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole bag as an object value.
    pub fn to_value(&self) -> Value {
        Value::object(self.iter().map(|(k, v)| (k, v.clone())))
    }

    /// A copy sharing no container with `self`.
    pub fn deep_clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.deep_clone()))
                .collect(),
        }
    }

    pub(crate) fn value_at(&self, index: usize) -> &Value {
        &self.entries[index].1
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Value) {
        self.entries[index].1 = value;
    }
}

impl<K, V> FromIterator<(K, V)> for StateBag
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = StateBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

impl Serialize for StateBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order() {
        let bag = StateBag::new().with("z", 1).with("a", 2).with("m", 3);
        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn insert_replaces_existing() {
        let mut bag = StateBag::new().with("count", 0);
        assert_eq!(bag.insert("count", 5), Some(Value::from(0)));
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("count"), Some(&Value::from(5)));
    }

    #[test]
    fn from_json_requires_object() {
        let bag = StateBag::from_json(json!({"count": 0, "flags": {"a": true}})).unwrap();
        assert_eq!(bag.len(), 2);
        assert!(bag.contains_key("flags"));
        assert!(matches!(
            StateBag::from_json(json!([1, 2])),
            Err(StoreError::InvalidState(_))
        ));
    }

    #[test]
    fn serializes_as_map() {
        let bag = StateBag::new().with("b", true).with("a", "x");
        assert_eq!(
            serde_json::to_string(&bag).unwrap(),
            r#"{"b":true,"a":"x"}"#
        );
    }
}
