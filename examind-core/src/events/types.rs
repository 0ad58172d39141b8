//! Event type definitions

use serde::{Deserialize, Serialize};

use crate::proctor::ViolationKind;
use crate::session::TerminationReason;

/// Session-status events published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExamEvent {
    /// A session was created and is awaiting device setup
    SessionStarted {
        session_id: String,
        exam_id: String,
        examinee_id: String,
    },

    /// Device setup finished; the adaptive loop may begin
    SessionActivated { session_id: String },

    /// Camera/microphone readiness changed
    DeviceStatusChanged {
        session_id: String,
        camera: bool,
        microphone: bool,
    },

    /// An item was issued to the examinee
    ItemIssued {
        session_id: String,
        item_id: String,
        difficulty: f64,
    },

    /// An answer was recorded and the estimate updated
    ResponseRecorded {
        session_id: String,
        item_id: String,
        is_correct: bool,
        ability: f64,
        standard_error: f64,
        sequence_index: u32,
    },

    /// A proctoring violation was recorded
    ViolationRecorded {
        session_id: String,
        kind: ViolationKind,
        severity: f64,
        escalation_level: u8,
    },

    /// The session crossed the review threshold
    EscalationRaised { session_id: String, level: u8 },

    /// The session completed naturally
    SessionCompleted {
        session_id: String,
        reason: TerminationReason,
        ability: f64,
        standard_error: f64,
    },

    /// The session was aborted (proctoring, cancellation, or
    /// infrastructure failure)
    SessionAborted {
        session_id: String,
        reason: TerminationReason,
    },
}

impl ExamEvent {
    /// The session this event belongs to
    pub fn session_id(&self) -> &str {
        match self {
            ExamEvent::SessionStarted { session_id, .. }
            | ExamEvent::SessionActivated { session_id }
            | ExamEvent::DeviceStatusChanged { session_id, .. }
            | ExamEvent::ItemIssued { session_id, .. }
            | ExamEvent::ResponseRecorded { session_id, .. }
            | ExamEvent::ViolationRecorded { session_id, .. }
            | ExamEvent::EscalationRaised { session_id, .. }
            | ExamEvent::SessionCompleted { session_id, .. }
            | ExamEvent::SessionAborted { session_id, .. } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_event_serializes_with_type_tag() {
        let event = ExamEvent::SessionActivated {
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"session_activated\""));
    }

    #[test]
    fn exam_event_serialization_roundtrip() {
        let events = vec![
            ExamEvent::SessionStarted {
                session_id: "s1".to_string(),
                exam_id: "exam-1".to_string(),
                examinee_id: "alice".to_string(),
            },
            ExamEvent::ResponseRecorded {
                session_id: "s1".to_string(),
                item_id: "q3".to_string(),
                is_correct: true,
                ability: 5.6,
                standard_error: 0.9,
                sequence_index: 0,
            },
            ExamEvent::ViolationRecorded {
                session_id: "s1".to_string(),
                kind: ViolationKind::FocusLoss,
                severity: 1.0,
                escalation_level: 0,
            },
            ExamEvent::SessionAborted {
                session_id: "s1".to_string(),
                reason: TerminationReason::Cancelled,
            },
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let parsed: ExamEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, parsed);
        }
    }

    #[test]
    fn session_id_is_extractable_from_every_variant() {
        let event = ExamEvent::ItemIssued {
            session_id: "sess-42".to_string(),
            item_id: "q1".to_string(),
            difficulty: 4.0,
        };
        assert_eq!(event.session_id(), "sess-42");
    }
}
