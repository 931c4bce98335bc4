use crate::error::{Result, StoreError};
use crate::value::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A dot-separated sequence of object fields, such as `"profile.address.city"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a dot-separated path.
    ///
    /// Empty paths and empty segments (`"a..b"`, `".a"`) are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StoreError::InvalidPath(raw.to_owned()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Rebuild `root` with the value at this path replaced by `f(current)`.
    ///
    /// Missing or non-object intermediates are treated as empty objects; a
    /// missing terminal field is passed to `f` as `Null`. Every object on
    /// the path is copied, every sibling branch is shared with `root`.
    pub fn update<F>(&self, root: &Value, f: F) -> Value
    where
        F: FnOnce(&Value) -> Value,
    {
        rebuild(root, &self.segments, f)
    }
}

fn rebuild<F>(node: &Value, segments: &[String], f: F) -> Value
where
    F: FnOnce(&Value) -> Value,
{
    let Some((field, rest)) = segments.split_first() else {
        return f(node);
    };

    let mut map = match node {
        Value::Object(map) => Map::clone(map),
        _ => Map::new(),
    };
    let child = match map.get(field) {
        Some(child) => child.clone(),
        None if rest.is_empty() => Value::Null,
        None => Value::empty_object(),
    };
    map.insert(field.clone(), rebuild(&child, rest, f));
    Value::from(map)
}

impl FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
