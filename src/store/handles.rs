use super::{Action, Store};
use crate::error::{Result, StoreError};
use crate::path::{deep_merge, Path};
use crate::value::{Shape, Value};
use std::ops::Deref;
use std::sync::Arc;

/// Handler of one state key: `set` and `reset`, available for every shape.
#[derive(Clone, Copy)]
pub struct KeyHandle<'s> {
    store: &'s Store,
    index: usize,
    shape: Shape,
}

impl<'s> KeyHandle<'s> {
    pub(crate) fn new(store: &'s Store, index: usize, shape: Shape) -> Self {
        Self {
            store,
            index,
            shape,
        }
    }

    pub fn key(&self) -> &'s str {
        self.store.key_at(self.index)
    }

    /// The shape bound at construction.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Current value of the key.
    pub fn get(&self) -> Value {
        self.store.value_at(self.index)
    }

    /// Replace the value, directly or as a function of the current one.
    pub fn set(&self, action: impl Into<Action>) {
        let action = action.into();
        self.store.update_at(self.index, |current| action.apply(current));
    }

    /// Restore the initial value, as a fresh copy.
    pub fn reset(&self) {
        self.store
            .replace_at(self.index, self.store.default_at(self.index));
    }

    /// The handle carrying this key's shape-specific operations.
    pub fn shaped(self) -> ShapedHandle<'s> {
        match self.shape {
            Shape::Array => ShapedHandle::Array(ArrayHandle(self)),
            Shape::Object => ShapedHandle::Object(ObjectHandle(self)),
            Shape::Boolean => ShapedHandle::Boolean(BoolHandle(self)),
            Shape::Opaque => ShapedHandle::Opaque(self),
        }
    }

    /// Read, compute and install without another mutation in between.
    fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Value) -> Result<(Option<Value>, T)>,
    {
        self.store.mutate_at(self.index, f)
    }

    fn mismatch(&self, found: &Value) -> StoreError {
        StoreError::ShapeMismatch {
            key: self.key().to_owned(),
            expected: self.shape,
            found: Shape::of(found),
        }
    }
}

impl std::fmt::Debug for KeyHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHandle")
            .field("key", &self.key())
            .field("shape", &self.shape)
            .finish()
    }
}

/// A key handler with the operations of its bound shape.
#[derive(Debug)]
pub enum ShapedHandle<'s> {
    Array(ArrayHandle<'s>),
    Object(ObjectHandle<'s>),
    Boolean(BoolHandle<'s>),
    Opaque(KeyHandle<'s>),
}

/// Handler of an array-shaped key.
///
/// Every operation installs a new array; the previous one is never edited.
/// Operations fail with [`StoreError::ShapeMismatch`] if the key no longer
/// holds an array.
#[derive(Debug, Clone, Copy)]
pub struct ArrayHandle<'s>(pub(crate) KeyHandle<'s>);

impl<'s> Deref for ArrayHandle<'s> {
    type Target = KeyHandle<'s>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ArrayHandle<'_> {
    fn items(&self) -> Result<Arc<Vec<Value>>> {
        match self.get() {
            Value::Array(items) => Ok(items),
            other => Err(self.mismatch(&other)),
        }
    }

    fn edit<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[Value]) -> Result<(Option<Vec<Value>>, T)>,
    {
        self.mutate(|current| match current {
            Value::Array(items) => {
                let (next, output) = f(items.as_slice())?;
                Ok((next.map(Value::from), output))
            }
            other => Err(self.mismatch(other)),
        })
    }

    fn check_index(&self, index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(StoreError::OutOfRange {
                key: self.key().to_owned(),
                index,
                len,
            })
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.items()?.is_empty())
    }

    /// Append an item.
    pub fn push(&self, item: impl Into<Value>) -> Result<()> {
        let item = item.into();
        self.edit(|items| {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.extend_from_slice(items);
            next.push(item);
            Ok((Some(next), ()))
        })
    }

    /// Remove and return the last item.
    ///
    /// An empty array is left untouched and `None` is returned, without
    /// notifying.
    pub fn pop(&self) -> Result<Option<Value>> {
        self.edit(|items| match items.split_last() {
            Some((last, rest)) => Ok((Some(rest.to_vec()), Some(last.clone()))),
            None => Ok((None, None)),
        })
    }

    /// Remove and return the first item. Empty arrays behave as in [`pop`](Self::pop).
    pub fn shift(&self) -> Result<Option<Value>> {
        self.edit(|items| match items.split_first() {
            Some((first, rest)) => Ok((Some(rest.to_vec()), Some(first.clone()))),
            None => Ok((None, None)),
        })
    }

    /// Prepend an item.
    pub fn unshift(&self, item: impl Into<Value>) -> Result<()> {
        let item = item.into();
        self.edit(|items| {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.push(item);
            next.extend_from_slice(items);
            Ok((Some(next), ()))
        })
    }

    /// Replace the item at `index`, returning its new value.
    pub fn update(&self, index: usize, action: impl Into<Action>) -> Result<Value> {
        let action = action.into();
        self.edit(|items| {
            self.check_index(index, items.len())?;

            let item = action.apply(&items[index]);
            let mut next = items.to_vec();
            next[index] = item.clone();
            Ok((Some(next), item))
        })
    }

    /// Remove the item at `index`, returning it.
    pub fn remove(&self, index: usize) -> Result<Value> {
        self.edit(|items| {
            self.check_index(index, items.len())?;

            let mut next = items.to_vec();
            let removed = next.remove(index);
            Ok((Some(next), removed))
        })
    }
}

/// Handler of an object-shaped key.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHandle<'s>(pub(crate) KeyHandle<'s>);

impl<'s> Deref for ObjectHandle<'s> {
    type Target = KeyHandle<'s>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ObjectHandle<'_> {
    fn edit<F>(&self, f: F) -> Result<Value>
    where
        F: FnOnce(&Value) -> Value,
    {
        self.mutate(|current| {
            if !matches!(current, Value::Object(_)) {
                return Err(self.mismatch(current));
            }
            let next = f(current);
            Ok((Some(next.clone()), next))
        })
    }

    /// Set the field at a dot-separated `path`, returning the new object.
    ///
    /// Objects along the path are rebuilt; everything else is shared with
    /// the previous value.
    pub fn update(&self, path: &str, action: impl Into<Action>) -> Result<Value> {
        let path = Path::parse(path)?;
        let action = action.into();

        self.edit(|current| path.update(current, |field| action.apply(field)))
    }

    /// Deep-merge `partial` into the current object, returning the result.
    pub fn update_many(&self, partial: impl Into<Value>) -> Result<Value> {
        let partial = partial.into();
        if !matches!(partial, Value::Object(_)) {
            return Err(StoreError::ShapeMismatch {
                key: self.key().to_owned(),
                expected: Shape::Object,
                found: Shape::of(&partial),
            });
        }

        self.edit(|current| deep_merge(current, &partial))
    }
}

/// Handler of a boolean-shaped key.
#[derive(Debug, Clone, Copy)]
pub struct BoolHandle<'s>(pub(crate) KeyHandle<'s>);

impl<'s> Deref for BoolHandle<'s> {
    type Target = KeyHandle<'s>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl BoolHandle<'_> {
    /// Flip the value, returning what it was before.
    pub fn toggle(&self) -> Result<bool> {
        self.mutate(|current| match current.as_bool() {
            Some(before) => Ok((Some(Value::Bool(!before)), before)),
            None => Err(self.mismatch(current)),
        })
    }
}
