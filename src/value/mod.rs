//! Dynamic values held by a store.
//!
//! Containers are reference counted so that every replacement can share the
//! untouched parts of the previous value, and so that "same object" has a
//! precise meaning: two containers are the same when they point at the same
//! allocation.

mod equality;
mod shape;
mod value;

pub use equality::shallow_equal;
pub use shape::Shape;
pub use value::{Map, Value};
