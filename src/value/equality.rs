use super::Value;

/// One-level structural comparison.
///
/// Two values are equal when they are the [same](Value::same), or when both
/// are arrays (or both objects) with the same number of entries and every
/// corresponding entry is the same. Nested containers are compared by
/// identity, never recursively.
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    if a.same(b) {
        return true;
    }

    match (a, b) {
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len() && left.iter().zip(right.iter()).all(|(l, r)| l.same(r))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, l)| right.get(key).is_some_and(|r| l.same(r)))
        }
        _ => false,
    }
}
