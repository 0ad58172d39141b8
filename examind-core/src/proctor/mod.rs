//! Proctoring monitor: violation intake, escalation, forced termination

mod monitor;
mod policy;
mod types;

pub use monitor::{ProctorAction, ProctorMonitor, ProctorState};
pub use policy::{ProctorPolicy, SeverityWeights};
pub use types::{DeviceStatus, Violation, ViolationKind};
