//! Stopping rules for CAT sessions
//!
//! Evaluated after every accepted response. Any one satisfied rule
//! ends the session as `Completed`; pool exhaustion is a completion
//! with reduced confidence, not an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::CatConfig;

/// Why a session reached a terminal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminationReason {
    /// Administered-item count reached the configured maximum
    MaxItemsReached,
    /// Standard error reached the precision threshold after the
    /// minimum item count
    PrecisionReached,
    /// The pool ran out before any other rule fired; the score carries
    /// reduced confidence
    PoolExhausted,
    /// The wall-clock budget ran out
    TimeBudgetExceeded,
    /// Proctoring escalation force-terminated the session
    ProctorTerminated { summary: String },
    /// Examinee or administrator cancelled the session
    Cancelled,
    /// Result could not be archived after retries
    InfrastructureFailure,
}

impl TerminationReason {
    /// Whether this reason represents a natural completion rather than
    /// an abort
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::MaxItemsReached
                | Self::PrecisionReached
                | Self::PoolExhausted
                | Self::TimeBudgetExceeded
        )
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxItemsReached => write!(f, "maximum item count reached"),
            Self::PrecisionReached => write!(f, "precision threshold reached"),
            Self::PoolExhausted => write!(f, "item pool exhausted"),
            Self::TimeBudgetExceeded => write!(f, "time budget exceeded"),
            Self::ProctorTerminated { summary } => {
                write!(f, "terminated by proctoring: {summary}")
            }
            Self::Cancelled => write!(f, "cancelled"),
            Self::InfrastructureFailure => write!(f, "infrastructure failure"),
        }
    }
}

/// The configured stopping rules, detached from session state so they
/// can be tested in isolation
#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    min_items: usize,
    max_items: usize,
    se_threshold: f64,
    time_budget: Duration,
}

impl TerminationPolicy {
    pub fn from_config(config: &CatConfig) -> Self {
        Self {
            min_items: config.min_items,
            max_items: config.max_items,
            se_threshold: config.se_threshold,
            time_budget: Duration::from_secs(config.time_budget_secs),
        }
    }

    /// Evaluate the stopping rules after a response
    ///
    /// Returns the first satisfied rule, or `None` to continue.
    pub fn evaluate(
        &self,
        items_administered: usize,
        standard_error: f64,
        pool_remaining: usize,
        elapsed: Duration,
    ) -> Option<TerminationReason> {
        if items_administered >= self.max_items {
            return Some(TerminationReason::MaxItemsReached);
        }
        if standard_error <= self.se_threshold && items_administered >= self.min_items {
            return Some(TerminationReason::PrecisionReached);
        }
        if pool_remaining == 0 {
            return Some(TerminationReason::PoolExhausted);
        }
        if elapsed >= self.time_budget {
            return Some(TerminationReason::TimeBudgetExceeded);
        }
        None
    }
}
