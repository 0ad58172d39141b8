//! Session coordinator
//!
//! Single entry point for the exam engine. One `CatSession` and one
//! `ProctorMonitor` are bound per session behind a per-session mutex:
//! answers and violations for the same session are serialized against
//! each other, while unrelated sessions proceed fully in parallel (the
//! registry lock is only held long enough to clone the entry handle).
//!
//! Forced termination is the single arbitration point between the two
//! state machines: a violation that crosses the termination threshold
//! aborts the CAT session under the same entry lock, so a racing
//! `submit_answer` observes either "accepted before termination" or
//! `SessionClosed`, never a partial update.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{EngineError, SessionError};
use crate::events::{EventBus, ExamEvent};
use crate::item::{Item, ItemBank};
use crate::proctor::{ProctorAction, ProctorMonitor, ProctorPolicy, ProctorState, ViolationKind};
use crate::session::{CatConfig, CatSession, CatState, SubmitOutcome, TerminationReason};
use crate::store::{ExamRecord, ResultStore};

/// Coordinator-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub cat: CatConfig,
    #[serde(default)]
    pub proctor: ProctorPolicy,
    /// Archive attempts before a session is downgraded to
    /// `InfrastructureFailure`
    #[serde(default = "default_archive_attempts")]
    pub archive_attempts: u32,
}

fn default_archive_attempts() -> u32 {
    3
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cat: CatConfig::default(),
            proctor: ProctorPolicy::default(),
            archive_attempts: default_archive_attempts(),
        }
    }
}

/// Acknowledgement returned for a recorded violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationAck {
    pub severity: f64,
    pub cumulative_severity: f64,
    pub escalation_level: u8,
    /// True when this violation force-terminated the session
    pub terminated: bool,
}

/// One session's pair of state machines plus archive bookkeeping
struct SessionEntry {
    cat: CatSession,
    proctor: ProctorMonitor,
    archived: bool,
}

impl SessionEntry {
    fn record(&self) -> ExamRecord {
        ExamRecord {
            session_id: self.cat.id().to_string(),
            exam_id: self.cat.exam_id().to_string(),
            examinee_id: self.cat.examinee_id().to_string(),
            ability_estimate: self.cat.ability(),
            standard_error: self.cat.standard_error(),
            termination_reason: self
                .cat
                .termination_reason()
                .cloned()
                .unwrap_or(TerminationReason::Cancelled),
            responses: self.cat.responses().to_vec(),
            violations: self.proctor.violations().to_vec(),
            selector_seed: self.cat.selector_seed(),
            started_at: self.cat.started_at(),
            ended_at: self.cat.ended_at(),
        }
    }
}

/// Coordinates all active exam sessions
pub struct SessionCoordinator {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>,
    item_bank: Arc<dyn ItemBank>,
    store: Arc<dyn ResultStore>,
    events: Arc<dyn EventBus>,
    config: CoordinatorConfig,
}

impl SessionCoordinator {
    pub fn new(
        item_bank: Arc<dyn ItemBank>,
        store: Arc<dyn ResultStore>,
        events: Arc<dyn EventBus>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            item_bank,
            store,
            events,
            config,
        }
    }

    /// Start a session for an examinee
    ///
    /// Fetches and snapshots the item pool, creates the session pair,
    /// and returns the new session id. An empty pool completes the
    /// session immediately with `PoolExhausted` and zero responses.
    pub async fn start(
        &self,
        exam_id: impl Into<String>,
        examinee_id: impl Into<String>,
    ) -> Result<String, EngineError> {
        let exam_id = exam_id.into();
        let examinee_id = examinee_id.into();

        let pool = self.item_bank.fetch_item_pool(&exam_id).await?;
        let id = Uuid::new_v4();
        let session_id = id.to_string();
        // Seed derives from the session id so an audit can replay the
        // selection sequence from the archived record alone.
        let seed = id.as_u128() as u64;

        let empty_pool = pool.is_empty();
        let mut entry = SessionEntry {
            cat: CatSession::new(
                session_id.clone(),
                exam_id.clone(),
                examinee_id.clone(),
                pool,
                self.config.cat.clone(),
                seed,
            ),
            proctor: ProctorMonitor::new(self.config.proctor.clone()),
            archived: false,
        };

        tracing::info!(session_id = %session_id, exam_id = %exam_id, examinee_id = %examinee_id, "session started");
        self.events
            .publish(ExamEvent::SessionStarted {
                session_id: session_id.clone(),
                exam_id,
                examinee_id,
            })
            .await;

        if empty_pool {
            // Nothing to administer; skip the device gate and finalize.
            entry.cat.activate().map_err(EngineError::Session)?;
            self.finalize(&mut entry).await;
        }

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::new(Mutex::new(entry)));
        Ok(session_id)
    }

    /// Report camera/microphone readiness for a session
    ///
    /// Once the required devices are ready the CAT session leaves
    /// `Initializing`. If the setup window has expired the session is
    /// discarded and `DeviceSetupTimeout` is reported; a session that
    /// never started is not persisted as started.
    pub async fn device_ready(
        &self,
        session_id: &str,
        camera: bool,
        microphone: bool,
    ) -> Result<ProctorState, EngineError> {
        let entry = self.entry(session_id).await?;
        let mut guard = entry.lock().await;

        if guard.cat.is_terminal() {
            return Err(self.closed(&guard).into());
        }

        let was_ready = guard.proctor.devices_ready();
        let state = match guard.proctor.device_update(camera, microphone) {
            Ok(state) => state,
            Err(crate::error::ProctorError::SetupTimedOut) => {
                drop(guard);
                self.discard(session_id).await;
                return Err(SessionError::DeviceSetupTimeout.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.events
            .publish(ExamEvent::DeviceStatusChanged {
                session_id: session_id.to_string(),
                camera,
                microphone,
            })
            .await;

        if state != ProctorState::AwaitingDeviceSetup
            && matches!(guard.cat.state(), CatState::Initializing)
        {
            guard.cat.activate().map_err(EngineError::Session)?;
            self.events
                .publish(ExamEvent::SessionActivated {
                    session_id: session_id.to_string(),
                })
                .await;
        }

        // A required device dropping mid-session is itself a violation.
        if was_ready && !guard.proctor.devices_ready() {
            self.apply_violation(
                session_id,
                &mut guard,
                ViolationKind::DeviceDisconnect,
                Some("required device went offline".to_string()),
            )
            .await?;
        }

        Ok(state)
    }

    /// Issue (or re-issue) the next item for a session
    pub async fn next_item(&self, session_id: &str) -> Result<Item, EngineError> {
        let entry = self.entry(session_id).await?;
        let mut guard = entry.lock().await;

        if matches!(guard.cat.state(), CatState::Initializing) && guard.proctor.setup_expired() {
            drop(guard);
            self.discard(session_id).await;
            return Err(SessionError::DeviceSetupTimeout.into());
        }

        match guard.cat.issue_item() {
            Ok(item) => {
                self.events
                    .publish(ExamEvent::ItemIssued {
                        session_id: session_id.to_string(),
                        item_id: item.id.clone(),
                        difficulty: item.difficulty,
                    })
                    .await;
                Ok(item)
            }
            Err(e) => {
                // Selecting may have just completed the session (pool
                // exhausted or time budget); finalize before reporting.
                if guard.cat.is_terminal() {
                    self.finalize(&mut guard).await;
                }
                Err(e.into())
            }
        }
    }

    /// Record an answer for the in-flight item
    ///
    /// Idempotent per `(session_id, item_id)`: a retry of an
    /// already-recorded item returns the original response unchanged
    /// with `replayed` set, without advancing the sequence.
    pub async fn submit_answer(
        &self,
        session_id: &str,
        item_id: &str,
        is_correct: bool,
        response_time_ms: u64,
    ) -> Result<SubmitOutcome, EngineError> {
        let entry = self.entry(session_id).await?;
        let mut guard = entry.lock().await;

        if let Some(existing) = guard.cat.recorded_response(item_id) {
            return Ok(SubmitOutcome {
                response: existing.clone(),
                finished: guard.cat.termination_reason().cloned(),
                replayed: true,
            });
        }

        let outcome = guard
            .cat
            .submit_answer(item_id, is_correct, response_time_ms)
            .map_err(EngineError::Session)?;

        self.events
            .publish(ExamEvent::ResponseRecorded {
                session_id: session_id.to_string(),
                item_id: item_id.to_string(),
                is_correct,
                ability: outcome.response.ability_after,
                standard_error: outcome.response.standard_error_after,
                sequence_index: outcome.response.sequence_index,
            })
            .await;

        if outcome.finished.is_some() {
            self.finalize(&mut guard).await;
        }
        Ok(outcome)
    }

    /// Report a proctoring violation for a session
    ///
    /// May force-terminate the session; the abort happens under the
    /// same per-session lock as answer submission, so termination wins
    /// any race deterministically.
    pub async fn report_violation(
        &self,
        session_id: &str,
        kind: ViolationKind,
        description: Option<String>,
    ) -> Result<ViolationAck, EngineError> {
        let entry = self.entry(session_id).await?;
        let mut guard = entry.lock().await;
        self.apply_violation(session_id, &mut guard, kind, description)
            .await
    }

    async fn apply_violation(
        &self,
        session_id: &str,
        guard: &mut SessionEntry,
        kind: ViolationKind,
        description: Option<String>,
    ) -> Result<ViolationAck, EngineError> {
        if guard.cat.is_terminal() {
            return Err(self.closed(guard).into());
        }

        let level_before = guard.proctor.escalation_level();
        let action = guard
            .proctor
            .report_violation(kind, description)
            .map_err(EngineError::Proctor)?;

        let severity = guard
            .proctor
            .violations()
            .last()
            .map(|v| v.severity)
            .unwrap_or(0.0);
        let level = guard.proctor.escalation_level();

        self.events
            .publish(ExamEvent::ViolationRecorded {
                session_id: session_id.to_string(),
                kind,
                severity,
                escalation_level: level,
            })
            .await;

        let terminated = match action {
            ProctorAction::Recorded => false,
            ProctorAction::Escalated { level } => {
                if level > level_before {
                    self.events
                        .publish(ExamEvent::EscalationRaised {
                            session_id: session_id.to_string(),
                            level,
                        })
                        .await;
                }
                false
            }
            ProctorAction::ForceTerminate { summary } => {
                // The one path allowed to interrupt AwaitingResponse.
                if guard
                    .cat
                    .abort(TerminationReason::ProctorTerminated { summary })
                    .is_ok()
                {
                    self.finalize(guard).await;
                }
                true
            }
        };

        Ok(ViolationAck {
            severity,
            cumulative_severity: guard.proctor.cumulative_severity(),
            escalation_level: level,
            terminated,
        })
    }

    /// Cancel a session (examinee- or administrator-initiated)
    pub async fn cancel(&self, session_id: &str) -> Result<(), EngineError> {
        let entry = self.entry(session_id).await?;
        let mut guard = entry.lock().await;
        guard
            .cat
            .abort(TerminationReason::Cancelled)
            .map_err(EngineError::Session)?;
        self.finalize(&mut guard).await;
        Ok(())
    }

    /// Fetch the final record of a terminated session
    ///
    /// Calling this on a session that is still running is a protocol
    /// error; the adaptive loop ends sessions via its stopping rules
    /// (or `cancel`), not via `complete`.
    pub async fn complete(&self, session_id: &str) -> Result<ExamRecord, EngineError> {
        let entry = self.entry(session_id).await?;
        let guard = entry.lock().await;
        if !guard.cat.is_terminal() {
            return Err(SessionError::StillActive.into());
        }
        Ok(guard.record())
    }

    /// Current CAT state of a session
    pub async fn session_state(&self, session_id: &str) -> Result<CatState, EngineError> {
        let entry = self.entry(session_id).await?;
        let guard = entry.lock().await;
        Ok(guard.cat.state().clone())
    }

    /// Current proctoring state of a session
    pub async fn proctor_state(&self, session_id: &str) -> Result<ProctorState, EngineError> {
        let entry = self.entry(session_id).await?;
        let guard = entry.lock().await;
        Ok(guard.proctor.state())
    }

    /// List all registered session ids
    pub async fn list_sessions(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Number of registered sessions (terminal ones included until
    /// removed)
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop a terminated session from the registry
    ///
    /// The archived record survives in the result store; only the
    /// in-memory entry is released. Active sessions cannot be removed.
    pub async fn remove_session(&self, session_id: &str) -> Result<(), EngineError> {
        let entry = self.entry(session_id).await?;
        {
            let guard = entry.lock().await;
            if !guard.cat.is_terminal() {
                return Err(SessionError::StillActive.into());
            }
        }
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn entry(&self, session_id: &str) -> Result<Arc<Mutex<SessionEntry>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    fn closed(&self, entry: &SessionEntry) -> SessionError {
        SessionError::SessionClosed {
            reason: entry
                .cat
                .termination_reason()
                .cloned()
                .unwrap_or(TerminationReason::Cancelled),
        }
    }

    /// Drop a session that never started (device setup failure)
    async fn discard(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
        tracing::warn!(session_id = %session_id, "session discarded before device setup completed");
    }

    /// Archive a terminal session and publish its terminal event
    ///
    /// Retries the store a bounded number of times; when retries
    /// exhaust the session is downgraded to `InfrastructureFailure`
    /// rather than left ambiguously open.
    async fn finalize(&self, entry: &mut SessionEntry) {
        if entry.archived {
            return;
        }

        let record = entry.record();
        let mut archived = false;
        for attempt in 1..=self.config.archive_attempts {
            match self.store.archive(&record).await {
                Ok(()) => {
                    archived = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %record.session_id,
                        attempt,
                        error = %e,
                        "failed to archive session result"
                    );
                    if attempt < self.config.archive_attempts {
                        tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
                    }
                }
            }
        }

        if !archived {
            tracing::error!(
                session_id = %record.session_id,
                "archive retries exhausted, marking session as infrastructure failure"
            );
            entry.cat.mark_infrastructure_failure();
            self.events
                .publish(ExamEvent::SessionAborted {
                    session_id: record.session_id.clone(),
                    reason: TerminationReason::InfrastructureFailure,
                })
                .await;
            entry.archived = true;
            return;
        }

        entry.archived = true;
        let reason = record.termination_reason.clone();
        let event = if reason.is_completion() {
            ExamEvent::SessionCompleted {
                session_id: record.session_id.clone(),
                reason,
                ability: record.ability_estimate,
                standard_error: record.standard_error,
            }
        } else {
            ExamEvent::SessionAborted {
                session_id: record.session_id.clone(),
                reason,
            }
        };
        self.events.publish(event).await;
    }
}
