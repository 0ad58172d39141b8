//! Per-session proctoring state machine
//!
//! Runs alongside the CAT session with its own clock and state. It
//! ingests pre-classified violation events, tracks cumulative weighted
//! severity, and tells the coordinator when to flag a session for
//! review or stop it outright. It never touches ability estimation.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ProctorError;

use super::policy::ProctorPolicy;
use super::types::{DeviceStatus, Violation, ViolationKind};

/// State of the proctoring monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProctorState {
    /// Waiting for required devices to report ready
    AwaitingDeviceSetup,
    /// Devices ready; accepting violation events
    Monitoring,
    /// Review threshold crossed; session continues, flagged for a human
    Escalated,
    /// Termination threshold crossed; the session must be aborted
    /// (never reverts)
    ForcedTermination,
}

/// What the coordinator should do after a violation is recorded
#[derive(Debug, Clone, PartialEq)]
pub enum ProctorAction {
    /// Recorded below the review threshold
    Recorded,
    /// Review threshold crossed (now or earlier); session continues
    Escalated { level: u8 },
    /// Termination threshold crossed; abort the bound CAT session
    ForceTerminate { summary: String },
}

/// Proctoring monitor for a single session
pub struct ProctorMonitor {
    state: ProctorState,
    device: DeviceStatus,
    violations: Vec<Violation>,
    cumulative_severity: f64,
    escalation_level: u8,
    policy: ProctorPolicy,
    setup_deadline: Instant,
}

impl ProctorMonitor {
    pub fn new(policy: ProctorPolicy) -> Self {
        let setup_deadline =
            Instant::now() + std::time::Duration::from_secs(policy.setup_timeout_secs);
        Self {
            state: ProctorState::AwaitingDeviceSetup,
            device: DeviceStatus::default(),
            violations: Vec::new(),
            cumulative_severity: 0.0,
            escalation_level: 0,
            policy,
            setup_deadline,
        }
    }

    pub fn state(&self) -> ProctorState {
        self.state
    }

    pub fn device_status(&self) -> DeviceStatus {
        self.device
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn cumulative_severity(&self) -> f64 {
        self.cumulative_severity
    }

    /// Escalation level: 0 = clean, 1 = flagged for review,
    /// 2 = force-terminated. Monotonically non-decreasing.
    pub fn escalation_level(&self) -> u8 {
        self.escalation_level
    }

    /// Whether the required devices currently report ready
    pub fn devices_ready(&self) -> bool {
        (!self.policy.require_camera || self.device.camera)
            && (!self.policy.require_microphone || self.device.microphone)
    }

    /// Whether the setup window has expired without the devices ever
    /// becoming ready
    pub fn setup_expired(&self) -> bool {
        self.state == ProctorState::AwaitingDeviceSetup && Instant::now() > self.setup_deadline
    }

    /// Ingest a camera/microphone readiness report
    ///
    /// Leaves `AwaitingDeviceSetup` once the required devices are
    /// ready. After the setup deadline the session can no longer start
    /// and `SetupTimedOut` is reported instead.
    pub fn device_update(&mut self, camera: bool, microphone: bool) -> Result<ProctorState, ProctorError> {
        if self.state == ProctorState::ForcedTermination {
            return Err(ProctorError::Terminated);
        }
        if self.setup_expired() {
            return Err(ProctorError::SetupTimedOut);
        }

        self.device = DeviceStatus { camera, microphone };
        if self.state == ProctorState::AwaitingDeviceSetup && self.devices_ready() {
            self.state = ProctorState::Monitoring;
            tracing::info!("proctoring devices ready, monitoring started");
        }
        Ok(self.state)
    }

    /// Record a violation and apply the escalation policy
    ///
    /// Severity comes from the policy's per-kind weights; cumulative
    /// severity over the session lifetime is compared against the
    /// review and termination thresholds. Violations reported after
    /// forced termination are rejected.
    pub fn report_violation(
        &mut self,
        kind: ViolationKind,
        description: Option<String>,
    ) -> Result<ProctorAction, ProctorError> {
        if self.state == ProctorState::ForcedTermination {
            return Err(ProctorError::Terminated);
        }

        let severity = self.policy.severity.weight(kind);
        self.violations.push(Violation {
            kind,
            severity,
            at: Utc::now(),
            description,
        });
        self.cumulative_severity += severity;

        if self.cumulative_severity >= self.policy.termination_threshold {
            self.state = ProctorState::ForcedTermination;
            self.escalation_level = 2;
            let summary = self.summary();
            tracing::warn!(
                cumulative_severity = self.cumulative_severity,
                violations = self.violations.len(),
                "proctoring forced termination"
            );
            return Ok(ProctorAction::ForceTerminate { summary });
        }

        if self.cumulative_severity >= self.policy.review_threshold {
            if self.state == ProctorState::Monitoring {
                self.state = ProctorState::Escalated;
                tracing::info!(
                    cumulative_severity = self.cumulative_severity,
                    "session escalated for review"
                );
            }
            self.escalation_level = self.escalation_level.max(1);
            return Ok(ProctorAction::Escalated {
                level: self.escalation_level,
            });
        }

        Ok(ProctorAction::Recorded)
    }

    /// One-line description of the violation history, attached to
    /// forced-termination reasons
    pub fn summary(&self) -> String {
        let last = self
            .violations
            .last()
            .map(|v| v.kind.as_str())
            .unwrap_or("none");
        format!(
            "{} violation(s), cumulative severity {:.1}, last: {}",
            self.violations.len(),
            self.cumulative_severity,
            last
        )
    }
}
