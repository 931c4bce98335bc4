use super::StateBag;
use crate::error::{Result, StoreError};
use crate::value::Value;

/// Working copy of the state bag given to a synchronous named handler.
///
/// Writes are limited to the store's existing keys. They become visible to
/// the store only if the handler returns `Ok`, and all at once.
#[derive(Debug)]
pub struct Draft {
    bag: StateBag,
    dirty: Vec<bool>,
}

impl Draft {
    pub(crate) fn new(bag: StateBag) -> Self {
        let dirty = vec![false; bag.len()];
        Self { bag, dirty }
    }

    /// Current value of `key` in this draft.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.bag
            .get(key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_owned()))
    }

    /// The whole draft state.
    pub fn state(&self) -> &StateBag {
        &self.bag
    }

    /// Replace the value of an existing key.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .bag
            .index_of(key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_owned()))?;
        self.bag.set_at(index, value.into());
        self.dirty[index] = true;
        Ok(())
    }

    /// Indices and values of every key written to.
    pub(crate) fn into_changes(self) -> Vec<(usize, Value)> {
        let Draft { bag, dirty } = self;
        dirty
            .into_iter()
            .enumerate()
            .filter(|(_, written)| *written)
            .map(|(index, _)| (index, bag.value_at(index).clone()))
            .collect()
    }
}
