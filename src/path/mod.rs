//! Structural rewrites of object values.
//!
//! Both operations rebuild only the containers they touch; every branch
//! outside the rewritten spine keeps its identity.

mod merge;
mod path;

pub use merge::deep_merge;
pub use path::Path;
