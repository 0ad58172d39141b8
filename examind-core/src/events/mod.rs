//! Session status event system
//!
//! State transitions, new estimates, and violations are broadcast to
//! observers (live-monitoring dashboards). Publication is best-effort:
//! observers may be absent with no effect on session correctness.

mod bus;
mod memory;
mod types;

pub use bus::{EventBus, EventSeq};
pub use memory::MemoryEventBus;
pub use types::ExamEvent;
