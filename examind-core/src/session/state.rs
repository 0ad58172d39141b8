//! CAT session state machine
//!
//! One `CatSession` per exam attempt. The session owns the pool
//! snapshot, the running ability estimate, the per-session selector,
//! and the ordered response log. Terminal states absorb every further
//! mutation with `SessionError::SessionClosed`.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::estimator;
use crate::item::Item;
use crate::selector::ItemSelector;

use super::config::CatConfig;
use super::termination::{TerminationPolicy, TerminationReason};

/// State of a CAT session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatState {
    /// Created; waiting for proctoring device setup
    Initializing,
    /// Ready for the selector to issue an item
    AwaitingItem,
    /// Exactly one item issued and awaiting its answer
    AwaitingResponse { item_id: String },
    /// Natural completion (terminal)
    Completed { reason: TerminationReason },
    /// External termination: proctoring, cancellation, or
    /// infrastructure failure (terminal)
    Aborted { reason: TerminationReason },
}

/// One recorded answer, append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: String,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub ability_before: f64,
    pub ability_after: f64,
    pub standard_error_after: f64,
    pub sequence_index: u32,
}

/// Result of an accepted (or replayed) answer submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub response: Response,
    /// Set when this submission triggered a stopping rule
    pub finished: Option<TerminationReason>,
    /// True when the response was already recorded and is being
    /// returned again for an idempotent retry
    pub replayed: bool,
}

/// A single examinee's adaptive session
pub struct CatSession {
    id: String,
    exam_id: String,
    examinee_id: String,
    state: CatState,
    ability: f64,
    standard_error: f64,
    pool: Vec<Item>,
    administered: HashSet<String>,
    responses: Vec<Response>,
    selector: ItemSelector,
    policy: TerminationPolicy,
    config: CatConfig,
    started_monotonic: Instant,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl CatSession {
    /// Create a session in `Initializing` with the configured priors
    ///
    /// `selector_seed` drives the item tie-break and is kept for audit.
    pub fn new(
        id: impl Into<String>,
        exam_id: impl Into<String>,
        examinee_id: impl Into<String>,
        pool: Vec<Item>,
        config: CatConfig,
        selector_seed: u64,
    ) -> Self {
        Self {
            id: id.into(),
            exam_id: exam_id.into(),
            examinee_id: examinee_id.into(),
            state: CatState::Initializing,
            ability: config.prior_ability,
            standard_error: config.prior_se,
            pool,
            administered: HashSet::new(),
            responses: Vec::new(),
            selector: ItemSelector::new(selector_seed, config.start_band_width),
            policy: TerminationPolicy::from_config(&config),
            config,
            started_monotonic: Instant::now(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub fn examinee_id(&self) -> &str {
        &self.examinee_id
    }

    pub fn state(&self) -> &CatState {
        &self.state
    }

    pub fn ability(&self) -> f64 {
        self.ability
    }

    pub fn standard_error(&self) -> f64 {
        self.standard_error
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn selector_seed(&self) -> u64 {
        self.selector.seed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            CatState::Completed { .. } | CatState::Aborted { .. }
        )
    }

    /// The terminal reason, if the session has ended
    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        match &self.state {
            CatState::Completed { reason } | CatState::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    /// Look up an already-recorded response by item, for idempotent
    /// retries
    pub fn recorded_response(&self, item_id: &str) -> Option<&Response> {
        self.responses.iter().find(|r| r.item_id == item_id)
    }

    fn pool_remaining(&self) -> usize {
        self.pool.len() - self.administered.len()
    }

    fn closed_error(&self) -> SessionError {
        let reason = self
            .termination_reason()
            .cloned()
            .unwrap_or(TerminationReason::Cancelled);
        SessionError::SessionClosed { reason }
    }

    /// Leave `Initializing` once proctoring reports devices ready
    ///
    /// An empty pool completes the session immediately with
    /// `PoolExhausted` and zero responses.
    pub fn activate(&mut self) -> Result<(), SessionError> {
        match self.state {
            CatState::Initializing => {
                if self.pool.is_empty() {
                    self.finish(CatState::Completed {
                        reason: TerminationReason::PoolExhausted,
                    });
                } else {
                    self.state = CatState::AwaitingItem;
                }
                Ok(())
            }
            CatState::Completed { .. } | CatState::Aborted { .. } => Err(self.closed_error()),
            _ => Ok(()), // already active; activation is idempotent
        }
    }

    /// Issue the next item
    ///
    /// Re-issues the in-flight item when one is pending, so a client
    /// can safely retry after a network loss. Selecting from an
    /// exhausted pool (or past the time budget) completes the session
    /// and reports `SessionClosed` with the completion reason.
    pub fn issue_item(&mut self) -> Result<Item, SessionError> {
        match &self.state {
            CatState::Initializing => Err(SessionError::NotActivated),
            CatState::Completed { .. } | CatState::Aborted { .. } => Err(self.closed_error()),
            CatState::AwaitingResponse { item_id } => {
                let item_id = item_id.clone();
                let item = self
                    .pool
                    .iter()
                    .find(|item| item.id == item_id)
                    .cloned()
                    .ok_or(SessionError::NoItemInFlight)?;
                Ok(item)
            }
            CatState::AwaitingItem => {
                if let Some(reason) = self.policy.evaluate(
                    self.responses.len(),
                    self.standard_error,
                    self.pool_remaining(),
                    self.started_monotonic.elapsed(),
                ) {
                    self.finish(CatState::Completed { reason });
                    return Err(self.closed_error());
                }

                let first_item = self.administered.is_empty();
                match self.selector.select_next(
                    self.ability,
                    &self.administered,
                    &self.pool,
                    first_item,
                ) {
                    Some(item) => {
                        self.administered.insert(item.id.clone());
                        self.state = CatState::AwaitingResponse {
                            item_id: item.id.clone(),
                        };
                        Ok(item)
                    }
                    None => {
                        self.finish(CatState::Completed {
                            reason: TerminationReason::PoolExhausted,
                        });
                        Err(self.closed_error())
                    }
                }
            }
        }
    }

    /// Record the answer for the in-flight item
    ///
    /// Exactly one submission is accepted per issued item. A different
    /// item id is a protocol error with no state change; an id that was
    /// already recorded is `AlreadyRecorded` (the coordinator replays
    /// the stored response for retries). After acceptance the stopping
    /// rules run and may end the session.
    pub fn submit_answer(
        &mut self,
        item_id: &str,
        is_correct: bool,
        response_time_ms: u64,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.recorded_response(item_id).is_some() {
            return Err(SessionError::AlreadyRecorded(item_id.to_string()));
        }

        let expected = match &self.state {
            CatState::AwaitingResponse { item_id } => item_id.clone(),
            CatState::Completed { .. } | CatState::Aborted { .. } => {
                return Err(self.closed_error());
            }
            _ => return Err(SessionError::NoItemInFlight),
        };
        if expected != item_id {
            return Err(SessionError::UnexpectedItem {
                expected,
                got: item_id.to_string(),
            });
        }

        // The in-flight item always comes from the pool snapshot.
        let item = self
            .pool
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
            .ok_or(SessionError::NoItemInFlight)?;

        let ability_before = self.ability;
        let update = estimator::update(
            &self.config.estimator,
            self.ability,
            self.standard_error,
            &item,
            is_correct,
        );
        self.ability = update.ability;
        self.standard_error = update.standard_error;

        let response = Response {
            item_id: item_id.to_string(),
            is_correct,
            response_time_ms,
            ability_before,
            ability_after: self.ability,
            standard_error_after: self.standard_error,
            sequence_index: self.responses.len() as u32,
        };
        self.responses.push(response.clone());

        let finished = self.policy.evaluate(
            self.responses.len(),
            self.standard_error,
            self.pool_remaining(),
            self.started_monotonic.elapsed(),
        );
        match &finished {
            Some(reason) => {
                self.finish(CatState::Completed {
                    reason: reason.clone(),
                });
            }
            None => self.state = CatState::AwaitingItem,
        }

        tracing::debug!(
            session_id = %self.id,
            item_id,
            is_correct,
            ability = self.ability,
            standard_error = self.standard_error,
            "response recorded"
        );

        Ok(SubmitOutcome {
            response,
            finished,
            replayed: false,
        })
    }

    /// Abort from outside the adaptive loop: proctoring, cancellation,
    /// or infrastructure failure
    pub fn abort(&mut self, reason: TerminationReason) -> Result<(), SessionError> {
        if self.is_terminal() {
            return Err(self.closed_error());
        }
        tracing::info!(session_id = %self.id, %reason, "session aborted");
        self.finish(CatState::Aborted { reason });
        Ok(())
    }

    /// Downgrade a session whose result could not be archived
    ///
    /// Overrides even a terminal state so a completed-but-unarchived
    /// session is never reported as cleanly finished.
    pub fn mark_infrastructure_failure(&mut self) {
        self.finish(CatState::Aborted {
            reason: TerminationReason::InfrastructureFailure,
        });
    }

    fn finish(&mut self, terminal: CatState) {
        self.state = terminal;
        self.ended_at = Some(Utc::now());
    }
}
