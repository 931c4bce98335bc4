use crate::error::HandlerError;
use crate::state::Draft;
use crate::store::Store;
use crate::value::{Map, Value};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Outcome of a caller-supplied named handler.
pub type HandlerResult = std::result::Result<Value, HandlerError>;

/// A synchronous named handler.
///
/// It works on a [`Draft`] of the whole state; the draft is committed, with
/// a single notification, only when the handler returns `Ok`.
pub type SyncHandler = dyn Fn(&mut Draft, &[Value]) -> HandlerResult + Send + Sync;

/// An asynchronous named handler.
///
/// It receives the store itself and mutates through its handlers. A single
/// extra notification fires once the future resolves to `Ok`.
pub type AsyncHandler = dyn Fn(Store, Vec<Value>) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// New value for a key: a replacement, or a function of the current value.
pub enum Action {
    Replace(Value),
    Update(Box<dyn FnOnce(&Value) -> Value>),
}

impl Action {
    /// An action computing the new value from the current one.
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&Value) -> Value + 'static,
    {
        Action::Update(Box::new(f))
    }

    pub(crate) fn apply(self, current: &Value) -> Value {
        match self {
            Action::Replace(value) => value,
            Action::Update(f) => f(current),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Action::Update(_) => f.write_str("Update(..)"),
        }
    }
}

macro_rules! action_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Action {
                fn from(value: $ty) -> Self {
                    Action::Replace(Value::from(value))
                }
            }
        )*
    };
}

action_from!(
    bool, i32, i64, u32, u64, usize, f64, &str, String, Vec<Value>, Map, serde_json::Value
);

impl From<Value> for Action {
    fn from(value: Value) -> Self {
        Action::Replace(value)
    }
}

/// One entry of the handler table.
pub(crate) enum HandlerEntry {
    /// Handler of the state key at this index.
    Key(usize),
    Sync(Arc<SyncHandler>),
    Async(Arc<AsyncHandler>),
}

impl HandlerEntry {
    fn kind(&self) -> &'static str {
        match self {
            HandlerEntry::Key(_) => "key",
            HandlerEntry::Sync(_) => "sync",
            HandlerEntry::Async(_) => "async",
        }
    }
}

/// Handlers by name, built once when the store is created.
#[derive(Default)]
pub(crate) struct HandlerTable {
    entries: BTreeMap<String, HandlerEntry>,
}

impl HandlerTable {
    /// Add an entry. A later registration replaces an earlier one with the
    /// same name.
    pub fn register(&mut self, name: String, entry: HandlerEntry) {
        let kind = entry.kind();
        if let Some(previous) = self.entries.insert(name.clone(), entry) {
            warn!(
                handler = %name,
                replaced = previous.kind(),
                by = kind,
                "handler name registered twice, keeping the later one"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
