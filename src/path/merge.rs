use crate::value::{Map, Value};

/// Merge `partial` into `target`.
///
/// When both sides are objects, every field of `partial` is merged into the
/// matching field of `target` (or added when `target` lacks it). Anything
/// else, arrays included, is replaced wholesale by `partial`.
pub fn deep_merge(target: &Value, partial: &Value) -> Value {
    match (target, partial) {
        (Value::Object(current), Value::Object(patch)) => {
            let mut merged = Map::clone(current);
            for (field, incoming) in patch.iter() {
                let next = match current.get(field) {
                    Some(existing) => deep_merge(existing, incoming),
                    None => incoming.clone(),
                };
                merged.insert(field.clone(), next);
            }
            Value::from(merged)
        }
        _ => partial.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_nested_objects() {
        let target = Value::from(json!({"a": {"x": 1, "y": 2}, "b": 3}));
        let partial = Value::from(json!({"a": {"y": 20}}));
        let merged = deep_merge(&target, &partial);
        assert_eq!(merged, Value::from(json!({"a": {"x": 1, "y": 20}, "b": 3})));
    }

    #[test]
    fn replaces_arrays_and_scalars() {
        let target = Value::from(json!({"list": [1, 2, 3], "n": {"deep": true}}));
        let partial = Value::from(json!({"list": [9], "n": 4}));
        let merged = deep_merge(&target, &partial);
        assert_eq!(merged, Value::from(json!({"list": [9], "n": 4})));
    }

    #[test]
    fn adds_missing_fields() {
        let target = Value::from(json!({"a": 1}));
        let merged = deep_merge(&target, &Value::from(json!({"b": {"c": 2}})));
        assert_eq!(merged, Value::from(json!({"a": 1, "b": {"c": 2}})));
    }

    #[test]
    fn untouched_branches_keep_identity() {
        let target = Value::from(json!({"keep": {"k": 1}, "edit": {"e": 1}}));
        let merged = deep_merge(&target, &Value::from(json!({"edit": {"e": 2}})));
        assert!(merged.get("keep").unwrap().same(target.get("keep").unwrap()));
        assert!(!merged.get("edit").unwrap().same(target.get("edit").unwrap()));
    }
}
