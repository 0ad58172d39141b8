//! Durable result handoff
//!
//! When a session reaches a terminal state its final record is handed
//! to the result store (gradebook, archive). Persistence mechanics are
//! out of scope here; the coordinator only needs an idempotent
//! `archive` keyed by session id, which it retries on transient
//! failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::proctor::Violation;
use crate::session::{Response, TerminationReason};

/// The archived outcome of one exam session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub session_id: String,
    pub exam_id: String,
    pub examinee_id: String,
    pub ability_estimate: f64,
    pub standard_error: f64,
    pub termination_reason: TerminationReason,
    pub responses: Vec<Response>,
    pub violations: Vec<Violation>,
    /// Selector seed, kept so the item sequence can be replayed in an
    /// audit
    pub selector_seed: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Destination for finished session records
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Archive a final record; idempotent by `session_id`
    async fn archive(&self, record: &ExamRecord) -> Result<(), StoreError>;
}

/// In-memory result store, inspectable from tests
#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<HashMap<String, ExamRecord>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &str) -> Option<ExamRecord> {
        self.records.read().await.get(session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn archive(&self, record: &ExamRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }
}

/// Result store that fails a fixed number of times before succeeding
///
/// Used to exercise the coordinator's retry and
/// infrastructure-failure paths.
pub struct FlakyResultStore {
    inner: MemoryResultStore,
    failures_left: AtomicU32,
}

impl FlakyResultStore {
    pub fn failing(times: u32) -> Self {
        Self {
            inner: MemoryResultStore::new(),
            failures_left: AtomicU32::new(times),
        }
    }

    pub async fn get(&self, session_id: &str) -> Option<ExamRecord> {
        self.inner.get(session_id).await
    }
}

#[async_trait]
impl ResultStore for FlakyResultStore {
    async fn archive(&self, record: &ExamRecord) -> Result<(), StoreError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected outage".to_string()));
        }
        self.inner.archive(record).await
    }
}
