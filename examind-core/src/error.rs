//! Error types for examind-core

use thiserror::Error;

use crate::session::TerminationReason;

/// Top-level error type for examind-core
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Proctoring error: {0}")]
    Proctor(#[from] ProctorError),

    #[error("Item bank error: {0}")]
    ItemBank(#[from] ItemBankError),

    #[error("Result store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors related to CAT session lifecycle and protocol
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session is closed: {reason}")]
    SessionClosed { reason: TerminationReason },

    #[error("Session is still active; it has no final result yet")]
    StillActive,

    #[error("Session has not been activated; device setup is incomplete")]
    NotActivated,

    #[error("Device setup did not complete within the configured timeout")]
    DeviceSetupTimeout,

    #[error("Answer submitted for item {got} but item {expected} is in flight")]
    UnexpectedItem { expected: String, got: String },

    #[error("No item is in flight; request the next item first")]
    NoItemInFlight,

    #[error("Answer for item {0} was already recorded")]
    AlreadyRecorded(String),
}

/// Errors from the proctoring monitor
#[derive(Error, Debug)]
pub enum ProctorError {
    #[error("Proctoring has force-terminated this session")]
    Terminated,

    #[error("Required proctoring devices are not ready")]
    DevicesNotReady,

    #[error("Device setup window expired")]
    SetupTimedOut,
}

/// Errors from the external item bank
#[derive(Error, Debug)]
pub enum ItemBankError {
    #[error("Item bank is unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown exam: {0}")]
    UnknownExam(String),
}

/// Errors from the durable result store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Result store is unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_error_not_found_displays_correctly() {
        let error = SessionError::NotFound("abc123".to_string());
        assert!(error.to_string().contains("Session not found"));
        assert!(error.to_string().contains("abc123"));
    }

    #[test]
    fn session_error_closed_includes_reason() {
        let error = SessionError::SessionClosed {
            reason: TerminationReason::MaxItemsReached,
        };
        assert!(error.to_string().contains("closed"));
    }

    #[test]
    fn session_error_unexpected_item_names_both_items() {
        let error = SessionError::UnexpectedItem {
            expected: "item-7".to_string(),
            got: "item-3".to_string(),
        };
        let text = error.to_string();
        assert!(text.contains("item-7"));
        assert!(text.contains("item-3"));
    }

    #[test]
    fn proctor_error_terminated_displays_correctly() {
        let error = ProctorError::Terminated;
        assert!(error.to_string().contains("force-terminated"));
    }

    #[test]
    fn item_bank_error_unknown_exam_displays_correctly() {
        let error = ItemBankError::UnknownExam("exam-9".to_string());
        assert!(error.to_string().contains("exam-9"));
    }

    #[test]
    fn engine_error_converts_from_session_error() {
        let session_error = SessionError::NotFound("test".to_string());
        let engine_error: EngineError = session_error.into();
        assert!(matches!(engine_error, EngineError::Session(_)));
    }

    #[test]
    fn engine_error_converts_from_store_error() {
        let store_error = StoreError::Unavailable("down".to_string());
        let engine_error: EngineError = store_error.into();
        assert!(matches!(engine_error, EngineError::Store(_)));
    }

    #[test]
    fn engine_error_converts_from_proctor_error() {
        let proctor_error = ProctorError::DevicesNotReady;
        let engine_error: EngineError = proctor_error.into();
        assert!(matches!(engine_error, EngineError::Proctor(_)));
    }
}
