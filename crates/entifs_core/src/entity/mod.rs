//! Entity types and auto-commit operations.

mod key;
mod record;
mod store;

pub use key::Key;
pub use record::{Entity, EntityArg, Fields};
pub use store::EntityStore;
