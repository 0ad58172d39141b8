//! Item pool types and the item bank interface
//!
//! Items are calibrated externally; the engine holds a read-only
//! snapshot of the pool for the lifetime of a session.

mod bank;
mod types;

pub use bank::{InMemoryItemBank, ItemBank};
pub use types::Item;
