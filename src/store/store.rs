use super::builder::StoreBuilder;
use super::handlers::{HandlerEntry, HandlerTable};
use super::handles::{ArrayHandle, BoolHandle, KeyHandle, ObjectHandle};
use crate::error::{Result, StoreError};
use crate::runtime::{Notifier, Selector, SnapshotCache, Subscription};
use crate::state::{Draft, StateBag};
use crate::value::{Shape, Value};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::Arc;
use tracing::{debug, trace};

struct StoreInner {
    state: RwLock<StateBag>,
    /// Held from the read of a value through the install of its successor.
    mutation: ReentrantMutex<()>,
    /// Deep copy of the initial state, only read by `reset`.
    defaults: StateBag,
    keys: Vec<String>,
    shapes: Vec<Shape>,
    handlers: HandlerTable,
    notifier: Arc<Notifier>,
    cache: Arc<SnapshotCache>,
}

/// A reactive state container.
///
/// The store owns a bag of named values whose key set is fixed at
/// construction. Every accepted mutation replaces a top-level value (never
/// editing one in place) and then notifies all subscribers. Reads go
/// through [`Selector`]s and return the previous snapshot whenever the
/// derived value is shallow-equal to it.
///
/// Cloning a store is cheap; clones share the same state.
///
/// # Examples
///
/// ```
/// use tallow::{Action, StateBag, Store, Value};
///
/// let store = Store::new(StateBag::new().with("count", 0).with("list", Value::array([1, 2])));
///
/// store.handle("count").unwrap().set(Action::update(|c| Value::from(c.as_i64().unwrap() + 1)));
/// store.array("list").unwrap().push(3).unwrap();
///
/// assert_eq!(store.value("count").unwrap(), Value::from(1));
/// assert_eq!(store.value("list").unwrap(), Value::array([1, 2, 3]));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store without named handlers.
    pub fn new(states: StateBag) -> Self {
        Self::builder(states).build()
    }

    /// Start configuring a store.
    pub fn builder(states: StateBag) -> StoreBuilder {
        StoreBuilder::new(states)
    }

    pub(crate) fn from_parts(states: StateBag, handlers: HandlerTable) -> Self {
        let keys = states.keys().map(str::to_owned).collect();
        let shapes = states.iter().map(|(_, value)| Shape::of(value)).collect();
        let defaults = states.deep_clone();

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(states),
                mutation: ReentrantMutex::new(()),
                defaults,
                keys,
                shapes,
                handlers,
                notifier: Arc::new(Notifier::new()),
                cache: Arc::new(SnapshotCache::new()),
            }),
        }
    }

    // --- Engine ---

    /// Current state bag.
    pub fn get(&self) -> StateBag {
        self.inner.state.read().clone()
    }

    /// Current value of one key.
    pub fn value(&self, key: &str) -> Result<Value> {
        let index = self.index_of(key)?;
        Ok(self.value_at(index))
    }

    /// Shape bound to `key` at construction.
    pub fn shape(&self, key: &str) -> Result<Shape> {
        let index = self.index_of(key)?;
        Ok(self.inner.shapes[index])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys.iter().map(String::as_str)
    }

    /// Install a new value for `key` and notify.
    ///
    /// The value is installed unconditionally, even if it equals the
    /// current one, and regardless of the key's bound shape.
    pub fn replace(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(key)?;
        self.replace_at(index, value.into());
        Ok(())
    }

    fn index_of(&self, key: &str) -> Result<usize> {
        self.inner
            .keys
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| StoreError::UnknownKey(key.to_owned()))
    }

    pub(crate) fn key_at(&self, index: usize) -> &str {
        &self.inner.keys[index]
    }

    pub(crate) fn value_at(&self, index: usize) -> Value {
        self.inner.state.read().value_at(index).clone()
    }

    pub(crate) fn default_at(&self, index: usize) -> Value {
        self.inner.defaults.value_at(index).deep_clone()
    }

    pub(crate) fn replace_at(&self, index: usize, value: Value) {
        self.update_at(index, |_| value);
    }

    /// Replace the value at `index` with `f(current)`, then notify.
    pub(crate) fn update_at<F>(&self, index: usize, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        {
            let _guard = self.inner.mutation.lock();
            let next = f(&self.value_at(index));
            self.install_at(index, next);
        }
        self.inner.notifier.notify();
    }

    /// Run `f` on the value at `index` and install the value it returns,
    /// if any. Subscribers are notified only when something was installed.
    ///
    /// No other mutation runs between the read and the install. `f` may
    /// call back into the store from the same thread.
    pub(crate) fn mutate_at<T, F>(&self, index: usize, f: F) -> Result<T>
    where
        F: FnOnce(&Value) -> Result<(Option<Value>, T)>,
    {
        let (installed, output) = {
            let _guard = self.inner.mutation.lock();
            let (next, output) = f(&self.value_at(index))?;
            let installed = next.is_some();
            if let Some(next) = next {
                self.install_at(index, next);
            }
            (installed, output)
        };

        if installed {
            self.inner.notifier.notify();
        }
        Ok(output)
    }

    fn install_at(&self, index: usize, value: Value) {
        self.inner.state.write().set_at(index, value);
        trace!(key = %self.key_at(index), "value replaced");
    }

    // --- Subscriptions and reads ---

    /// Register a callback invoked after every accepted mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.notifier.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.notifier.subscriber_count()
    }

    /// Register a selector with this store.
    pub fn selector<F>(&self, select: F) -> Selector
    where
        F: Fn(&StateBag) -> Value + Send + Sync + 'static,
    {
        Selector::new(&self.inner.cache, select)
    }

    /// Derived value of `selector` for the current state.
    ///
    /// Between two mutations, and across mutations that leave the derived
    /// value shallow-equal, the same snapshot is returned. Selectors from
    /// another store are evaluated but not cached.
    pub fn read(&self, selector: &Selector) -> Value {
        let state = self.get();
        let fresh = selector.select(&state);

        if selector.is_issued_by(&self.inner.cache) {
            self.inner.cache.resolve(selector.id(), fresh)
        } else {
            debug!(selector = ?selector.id(), "selector issued by another store, not cached");
            fresh
        }
    }

    /// Number of live snapshot cache entries.
    pub fn cached_snapshots(&self) -> usize {
        self.inner.cache.len()
    }

    /// Call `callback` with the selector's value whenever a notification
    /// produces a snapshot that is not the previous one.
    ///
    /// The subscription keeps the selector, and so its cache entry, alive.
    pub fn watch<F>(&self, selector: &Selector, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let last = Mutex::new(self.read(selector));
        let store = Arc::downgrade(&self.inner);
        let selector = selector.clone();

        self.subscribe(move || {
            let Some(inner) = store.upgrade() else {
                return;
            };
            let next = Store { inner }.read(&selector);
            {
                let mut last = last.lock();
                if last.same(&next) {
                    return;
                }
                *last = next.clone();
            }
            callback(&next);
        })
    }

    // --- Handlers ---

    /// Names of every handler, key handlers included.
    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.inner.handlers.names()
    }

    /// The handler of a state key.
    pub fn handle(&self, key: &str) -> Result<KeyHandle<'_>> {
        match self.inner.handlers.get(key) {
            Some(HandlerEntry::Key(index)) => {
                Ok(KeyHandle::new(self, *index, self.inner.shapes[*index]))
            }
            _ => Err(StoreError::UnknownKey(key.to_owned())),
        }
    }

    fn shaped(&self, key: &str, expected: Shape) -> Result<KeyHandle<'_>> {
        let handle = self.handle(key)?;
        if handle.shape() != expected {
            return Err(StoreError::ShapeMismatch {
                key: key.to_owned(),
                expected,
                found: handle.shape(),
            });
        }
        Ok(handle)
    }

    /// The handler of an array-shaped key.
    pub fn array(&self, key: &str) -> Result<ArrayHandle<'_>> {
        self.shaped(key, Shape::Array).map(ArrayHandle)
    }

    /// The handler of an object-shaped key.
    pub fn object(&self, key: &str) -> Result<ObjectHandle<'_>> {
        self.shaped(key, Shape::Object).map(ObjectHandle)
    }

    /// The handler of a boolean-shaped key.
    pub fn boolean(&self, key: &str) -> Result<BoolHandle<'_>> {
        self.shaped(key, Shape::Boolean).map(BoolHandle)
    }

    /// Run a synchronous named handler.
    ///
    /// No other mutation interleaves with the handler. On success its draft
    /// is committed and subscribers are notified once.
    /// On failure nothing changes and the handler's error is returned as
    /// [`StoreError::HandlerRejected`].
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let handler = match self.inner.handlers.get(name) {
            Some(HandlerEntry::Sync(handler)) => Arc::clone(handler),
            _ => return Err(StoreError::UnknownHandler(name.to_owned())),
        };

        let output = {
            let _guard = self.inner.mutation.lock();
            let mut draft = Draft::new(self.get());
            let output = handler(&mut draft, args).map_err(|source| {
                StoreError::HandlerRejected {
                    name: name.to_owned(),
                    source,
                }
            })?;

            let mut state = self.inner.state.write();
            for (index, value) in draft.into_changes() {
                state.set_at(index, value);
            }
            output
        };

        debug!(handler = name, "sync handler completed");
        self.inner.notifier.notify();
        Ok(output)
    }

    /// Run an asynchronous named handler.
    ///
    /// Other handlers may run while this one is suspended, so it should
    /// re-read state after every `.await`. Subscribers are
    /// notified once more when it succeeds; when it fails no notification
    /// fires and mutations it already made through other handlers stay.
    pub async fn call_async(&self, name: &str, args: &[Value]) -> Result<Value> {
        let handler = match self.inner.handlers.get(name) {
            Some(HandlerEntry::Async(handler)) => Arc::clone(handler),
            _ => return Err(StoreError::UnknownHandler(name.to_owned())),
        };

        let output = handler(self.clone(), args.to_vec())
            .await
            .map_err(|source| StoreError::HandlerRejected {
                name: name.to_owned(),
                source,
            })?;

        debug!(handler = name, "async handler completed");
        self.inner.notifier.notify();
        Ok(output)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.read())
            .field("handlers", &self.inner.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Action;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> Store {
        Store::new(
            StateBag::from_json(json!({"count": 0, "list": [1, 2], "flags": {"a": true}}))
                .unwrap(),
        )
    }

    fn counter(store: &Store) -> (Arc<AtomicUsize>, Subscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = store.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (calls, sub)
    }

    #[test]
    fn store_get_set() {
        let store = sample();
        assert_eq!(store.value("count").unwrap(), Value::from(0));

        store.handle("count").unwrap().set(42);
        assert_eq!(store.get().get("count"), Some(&Value::from(42)));
    }

    #[test]
    fn replace_notifies_even_when_unchanged() {
        let store = sample();
        let (calls, _sub) = counter(&store);

        store.replace("count", 0).unwrap();
        store.replace("count", 0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            store.replace("missing", 1),
            Err(StoreError::UnknownKey(_))
        ));
    }

    #[test]
    fn shapes_are_bound_once() {
        let store = sample();
        assert_eq!(store.shape("list").unwrap(), Shape::Array);

        store.handle("list").unwrap().set("not a list");
        assert_eq!(store.shape("list").unwrap(), Shape::Array);
        assert!(matches!(
            store.array("list").unwrap().push(1),
            Err(StoreError::ShapeMismatch {
                expected: Shape::Array,
                found: Shape::Opaque,
                ..
            })
        ));
    }

    #[test]
    fn updater_can_reenter_store() {
        let store = sample();
        let (calls, _sub) = counter(&store);

        let inner = store.clone();
        store.handle("count").unwrap().set(Action::update(move |c| {
            let list = inner.array("list").unwrap();
            list.push(3).unwrap();
            Value::from(c.as_i64().unwrap_or(0) + list.len().unwrap() as i64)
        }));

        assert_eq!(store.value("count").unwrap(), Value::from(3));
        assert_eq!(store.value("list").unwrap(), Value::array([1, 2, 3]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn typed_handle_requires_bound_shape() {
        let store = sample();
        assert!(store.object("flags").is_ok());
        assert!(matches!(
            store.boolean("count"),
            Err(StoreError::ShapeMismatch { .. })
        ));
        assert!(matches!(store.handle("nope"), Err(StoreError::UnknownKey(_))));
    }

    #[test]
    fn read_is_stable_between_mutations() {
        let store = sample();
        let flags = store.selector(|state| state.get("flags").cloned().unwrap_or_default());

        let first = store.read(&flags);
        let second = store.read(&flags);
        assert!(first.same(&second));

        store.handle("count").unwrap().set(Action::update(|c| {
            Value::from(c.as_i64().unwrap_or(0) + 1)
        }));
        assert!(store.read(&flags).same(&first));

        store.object("flags").unwrap().update("a", false).unwrap();
        let third = store.read(&flags);
        assert!(!third.same(&first));
        assert_eq!(third, Value::from(json!({"a": false})));
    }

    #[test]
    fn shallow_equal_derivations_keep_identity() {
        let store = sample();
        let pair = store.selector(|state| {
            Value::array([
                state.get("count").cloned().unwrap_or_default(),
                state.get("list").cloned().unwrap_or_default(),
            ])
        });

        let first = store.read(&pair);
        store.replace("flags", Value::empty_object()).unwrap();
        assert!(store.read(&pair).same(&first));

        store.array("list").unwrap().push(3).unwrap();
        assert!(!store.read(&pair).same(&first));
    }

    #[test]
    fn dropping_selector_evicts_snapshot() {
        let store = sample();
        let selector = store.selector(|state| state.to_value());
        store.read(&selector);
        assert_eq!(store.cached_snapshots(), 1);

        drop(selector);
        assert_eq!(store.cached_snapshots(), 0);
    }

    #[test]
    fn foreign_selector_is_not_cached() {
        let store = sample();
        let other = sample();
        let selector = other.selector(|state| state.to_value());

        let first = store.read(&selector);
        let second = store.read(&selector);
        assert_eq!(first, second);
        assert!(!first.same(&second));
        assert_eq!(store.cached_snapshots(), 0);
    }

    #[test]
    fn watch_fires_only_on_visible_change() {
        let store = sample();
        let list = store.selector(|state| state.get("list").cloned().unwrap_or_default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        let sub = store.watch(&list, move |value| log.lock().push(value.clone()));

        store.handle("count").unwrap().set(5);
        store.array("list").unwrap().push(3).unwrap();
        assert_eq!(*seen.lock(), vec![Value::array([1, 2, 3])]);

        drop(list);
        assert_eq!(store.cached_snapshots(), 1);
        sub.unsubscribe();
        assert_eq!(store.cached_snapshots(), 0);
    }
}
