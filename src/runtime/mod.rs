//! Runtime support shared by every store.
//!
//! This module provides change notification, the snapshot cache behind
//! selector reads, and the per-thread scope used to provide a store to
//! code that has no direct handle on it.

mod cache;
mod notifier;
mod scope;

pub(crate) use cache::SnapshotCache;
pub use cache::{Selector, SelectorId};
pub(crate) use notifier::Notifier;
pub use notifier::{SubscriberId, Subscription};
pub use scope::StoreScope;
