//! examind-core: adaptive exam engine with integrated proctoring
//!
//! This crate provides the core of a Computer Adaptive Test (CAT)
//! platform:
//!
//! - **Ability estimation** - [`estimator`] updates a running
//!   proficiency estimate and its standard error per answer
//! - **Item selection** - [`ItemSelector`] picks the closest-difficulty
//!   unused item, with a seeded tie-break and first-item exposure
//!   control
//! - **Session state machine** - [`CatSession`] drives the adaptive
//!   loop and its stopping rules
//! - **Proctoring** - [`ProctorMonitor`] ingests violation events,
//!   escalates, and can force-terminate a session
//! - **Coordination** - [`SessionCoordinator`] binds one session pair
//!   per examinee, serializes per-session access, and broadcasts
//!   status events over the [`EventBus`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use examind_core::{
//!     CoordinatorConfig, InMemoryItemBank, Item, MemoryEventBus, MemoryResultStore,
//!     SessionCoordinator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bank = Arc::new(InMemoryItemBank::new());
//!     bank.insert_pool("algebra-101", vec![Item::new("q1", 4.0), Item::new("q2", 6.0)])
//!         .await;
//!
//!     let coordinator = SessionCoordinator::new(
//!         bank,
//!         Arc::new(MemoryResultStore::new()),
//!         Arc::new(MemoryEventBus::new(256)),
//!         CoordinatorConfig::default(),
//!     );
//!
//!     let session_id = coordinator.start("algebra-101", "examinee-7").await?;
//!     coordinator.device_ready(&session_id, true, true).await?;
//!
//!     let item = coordinator.next_item(&session_id).await?;
//!     coordinator.submit_answer(&session_id, &item.id, true, 850).await?;
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod estimator;
pub mod events;
pub mod item;
pub mod proctor;
pub mod selector;
pub mod session;
pub mod store;

// Re-export key types for convenience
pub use coordinator::{CoordinatorConfig, SessionCoordinator, ViolationAck};
pub use error::{EngineError, ItemBankError, ProctorError, SessionError, StoreError};
pub use estimator::{AbilityUpdate, EstimatorConfig};
pub use events::{EventBus, EventSeq, ExamEvent, MemoryEventBus};
pub use item::{InMemoryItemBank, Item, ItemBank};
pub use proctor::{
    DeviceStatus, ProctorAction, ProctorMonitor, ProctorPolicy, ProctorState, SeverityWeights,
    Violation, ViolationKind,
};
pub use selector::ItemSelector;
pub use session::{
    CatConfig, CatSession, CatState, Response, SubmitOutcome, TerminationPolicy, TerminationReason,
};
pub use store::{ExamRecord, FlakyResultStore, MemoryResultStore, ResultStore};
