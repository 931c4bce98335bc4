use crate::state::StateBag;
use crate::value::{shallow_equal, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

type SelectFn = dyn Fn(&StateBag) -> Value + Send + Sync;

static NEXT_SELECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier issued to every selector; the key of its snapshot cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectorId(u64);

/// Last derived value per selector.
pub(crate) struct SnapshotCache {
    entries: Mutex<HashMap<SelectorId, Value>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached snapshot if it is shallow-equal to `fresh`,
    /// otherwise remember and return `fresh`.
    pub fn resolve(&self, id: SelectorId, fresh: Value) -> Value {
        let mut entries = self.entries.lock();
        match entries.get(&id) {
            Some(cached) if shallow_equal(cached, &fresh) => {
                trace!(selector = id.0, "snapshot reused");
                cached.clone()
            }
            _ => {
                trace!(selector = id.0, "snapshot replaced");
                entries.insert(id, fresh.clone());
                fresh
            }
        }
    }

    pub fn evict(&self, id: SelectorId) {
        let evicted = self.entries.lock().remove(&id);
        if evicted.is_some() {
            trace!(selector = id.0, "snapshot evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

struct SelectorInner {
    id: SelectorId,
    select: Box<SelectFn>,
    cache: Weak<SnapshotCache>,
}

impl Drop for SelectorInner {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.evict(self.id);
        }
    }
}

/// A pure function from the state bag to a derived value, registered with
/// one store.
///
/// Reads through the same selector return the same snapshot for as long
/// as the derived value stays shallow-equal. The snapshot is evicted when
/// the last clone of the selector is dropped.
#[derive(Clone)]
pub struct Selector {
    inner: Arc<SelectorInner>,
}

impl Selector {
    pub(crate) fn new<F>(cache: &Arc<SnapshotCache>, select: F) -> Self
    where
        F: Fn(&StateBag) -> Value + Send + Sync + 'static,
    {
        let id = SelectorId(NEXT_SELECTOR_ID.fetch_add(1, Ordering::SeqCst));
        Self {
            inner: Arc::new(SelectorInner {
                id,
                select: Box::new(select),
                cache: Arc::downgrade(cache),
            }),
        }
    }

    pub fn id(&self) -> SelectorId {
        self.inner.id
    }

    pub(crate) fn select(&self, state: &StateBag) -> Value {
        (self.inner.select)(state)
    }

    /// Whether this selector was issued by the store owning `cache`.
    pub(crate) fn is_issued_by(&self, cache: &Arc<SnapshotCache>) -> bool {
        std::ptr::eq(self.inner.cache.as_ptr(), Arc::as_ptr(cache))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector").field("id", &self.inner.id).finish()
    }
}
