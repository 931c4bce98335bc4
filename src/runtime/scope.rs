use crate::error::{Result, StoreError};
use crate::store::Store;
use std::cell::RefCell;

// Thread-local stack of provided stores
thread_local! {
    static STORE_STACK: RefCell<Vec<Store>> = const { RefCell::new(Vec::new()) };
}

/// Per-thread provision of a store to code without a direct handle on it.
///
/// Scopes nest: the innermost provided store is the current one.
///
/// # Examples
///
/// ```
/// use tallow::{StateBag, Store, StoreScope};
///
/// let store = Store::new(StateBag::new().with("count", 0));
/// StoreScope::provide(store, || {
///     let current = StoreScope::current().unwrap();
///     assert_eq!(current.value("count").unwrap().as_i64(), Some(0));
/// });
///
/// assert!(StoreScope::current().is_err());
/// ```
pub struct StoreScope;

impl StoreScope {
    /// Run `f` with `store` as the current store of this thread.
    ///
    /// The store is withdrawn when `f` returns, including by unwinding.
    pub fn provide<F, R>(store: Store, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        STORE_STACK.with(|stack| {
            stack.borrow_mut().push(store);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        STORE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// The innermost provided store.
    ///
    /// Fails with [`StoreError::MissingProvider`] outside every scope.
    pub fn current() -> Result<Store> {
        STORE_STACK
            .with(|stack| stack.borrow().last().cloned())
            .ok_or(StoreError::MissingProvider)
    }

    /// Number of nested scopes active on this thread.
    pub fn depth() -> usize {
        STORE_STACK.with(|stack| stack.borrow().len())
    }
}
