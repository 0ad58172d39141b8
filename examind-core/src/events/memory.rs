//! In-memory EventBus implementation

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use super::ExamEvent;
use super::bus::{EventBus, EventSeq};

/// In-memory implementation of [`EventBus`]
///
/// A Vec holds history for replay; a broadcast channel feeds live
/// subscribers. Send failures (no subscribers) are ignored by design:
/// observers are best-effort.
pub struct MemoryEventBus {
    events: RwLock<Vec<(EventSeq, ExamEvent)>>,
    next_seq: AtomicU64,
    tx: broadcast::Sender<(EventSeq, ExamEvent)>,
}

impl MemoryEventBus {
    /// Create a bus with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            events: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            tx,
        }
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: ExamEvent) -> EventSeq {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.events.write().await.push((seq, event.clone()));
        let _ = self.tx.send((seq, event));
        seq
    }

    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, ExamEvent)> {
        self.tx.subscribe()
    }

    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, ExamEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(s, _)| *s >= seq)
            .cloned()
            .collect()
    }

    async fn session_events(&self, session_id: &str) -> Vec<(EventSeq, ExamEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(_, event)| event.session_id() == session_id)
            .cloned()
            .collect()
    }

    fn current_seq(&self) -> EventSeq {
        self.next_seq.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn started(session_id: &str) -> ExamEvent {
        ExamEvent::SessionStarted {
            session_id: session_id.to_string(),
            exam_id: "exam-1".to_string(),
            examinee_id: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn publish_assigns_increasing_sequence_numbers() {
        let bus = MemoryEventBus::new(16);
        assert_eq!(bus.publish(started("s1")).await, 0);
        assert_eq!(bus.publish(started("s2")).await, 1);
        assert_eq!(bus.current_seq(), 2);
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let bus = MemoryEventBus::new(16);
        bus.publish(started("s1")).await;
        assert_eq!(bus.events_from(0).await.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let bus = MemoryEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(started("s1")).await;
        bus.publish(started("s2")).await;

        let (seq1, _) = rx.recv().await.unwrap();
        let (seq2, _) = rx.recv().await.unwrap();
        assert_eq!(seq1, 0);
        assert_eq!(seq2, 1);
    }

    #[tokio::test]
    async fn session_events_filters_by_session() {
        let bus = MemoryEventBus::new(16);
        bus.publish(started("s1")).await;
        bus.publish(started("s2")).await;
        bus.publish(ExamEvent::SessionActivated {
            session_id: "s1".to_string(),
        })
        .await;

        assert_eq!(bus.session_events("s1").await.len(), 2);
        assert_eq!(bus.session_events("s2").await.len(), 1);
        assert!(bus.session_events("missing").await.is_empty());
    }

    #[tokio::test]
    async fn events_from_replays_the_suffix() {
        let bus = MemoryEventBus::new(16);
        for i in 0..5 {
            bus.publish(started(&format!("s{i}"))).await;
        }
        let tail = bus.events_from(3).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].0, 3);
    }

    #[tokio::test]
    async fn concurrent_publish_keeps_sequences_unique() {
        let bus = Arc::new(MemoryEventBus::new(256));
        let mut handles = vec![];
        for i in 0..8 {
            let bus = Arc::clone(&bus);
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    bus.publish(started(&format!("s{i}-{j}"))).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = bus.events_from(0).await;
        assert_eq!(all.len(), 80);
        let mut seqs: Vec<_> = all.iter().map(|(seq, _)| *seq).collect();
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 80);
    }
}
