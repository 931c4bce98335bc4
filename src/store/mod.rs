//! The store: state bag, handlers, subscriptions and selector reads.
//!
//! Every key of the initial state gets a handler bound to the shape of its
//! initial value. Caller-supplied named handlers live in the same table.

mod builder;
mod handlers;
mod handles;
mod store;

pub use builder::{create_store, NamedHandlers, StoreBuilder};
pub use handlers::{Action, AsyncHandler, HandlerResult, SyncHandler};
pub use handles::{ArrayHandle, BoolHandle, KeyHandle, ObjectHandle, ShapedHandle};
pub use store::Store;
