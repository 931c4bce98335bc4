//! The state bag and the draft handed to synchronous named handlers.

mod bag;
mod draft;

pub use bag::StateBag;
pub use draft::Draft;
