//! # Tallow
//!
//! A minimal reactive state container.
//!
//! A [`Store`] holds a fixed set of named values and offers three things:
//!
//! ## Handlers
//!
//! Every key gets a handler bound, once, to the shape of its initial value:
//! - every key: `set` (value or updater function) and `reset`
//! - arrays: `push`, `pop`, `shift`, `unshift`, `update(index)`, `remove(index)`
//! - objects: `update(path)` on dot-separated paths and `update_many` deep merges
//! - booleans: `toggle`
//!
//! Named handlers, synchronous or asynchronous, can be registered alongside.
//!
//! ## Subscriptions
//!
//! Subscribers are notified, without payload, after each accepted mutation.
//!
//! ## Selectors
//!
//! Reads go through selectors and are memoized: while the derived value
//! stays shallow-equal, the same snapshot is returned, so consumers can
//! detect changes by identity alone.

pub mod error;
pub mod path;
pub mod runtime;
pub mod state;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use error::{HandlerError, Result, StoreError};
pub use runtime::{Selector, SelectorId, StoreScope, SubscriberId, Subscription};
pub use state::{Draft, StateBag};
pub use store::{
    create_store, Action, ArrayHandle, BoolHandle, HandlerResult, KeyHandle, NamedHandlers,
    ObjectHandle, ShapedHandle, Store, StoreBuilder,
};
pub use value::{shallow_equal, Map, Shape, Value};
