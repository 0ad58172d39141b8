//! EventBus trait definition

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::ExamEvent;

/// Sequence number for events (monotonically increasing)
pub type EventSeq = u64;

/// Publish/subscribe feed of session-status events
///
/// Publishing must never block or fail a state transition: slow or
/// absent observers are ignored. Implementations keep history so a
/// dashboard joining mid-exam can replay a session's events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event, returns its sequence number
    async fn publish(&self, event: ExamEvent) -> EventSeq;

    /// Subscribe to all events from now (live stream)
    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, ExamEvent)>;

    /// Get all events starting from a sequence number (for replay)
    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, ExamEvent)>;

    /// Get all events for one session (for late-joining dashboards)
    async fn session_events(&self, session_id: &str) -> Vec<(EventSeq, ExamEvent)>;

    /// Current sequence number (high water mark)
    fn current_seq(&self) -> EventSeq;
}
