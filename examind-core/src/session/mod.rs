//! CAT session state machine, configuration, and termination policy

mod config;
mod state;
mod termination;

pub use config::CatConfig;
pub use state::{CatSession, CatState, Response, SubmitOutcome};
pub use termination::{TerminationPolicy, TerminationReason};
