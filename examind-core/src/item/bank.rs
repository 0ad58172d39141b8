//! ItemBank trait and the in-memory implementation
//!
//! The item bank is an external collaborator; the engine only fetches
//! a pool snapshot per session. InMemoryItemBank doubles as the test
//! implementation, with a switch to simulate bank outages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ItemBankError;

use super::Item;

/// Read-only source of calibrated item pools, keyed by exam
#[async_trait]
pub trait ItemBank: Send + Sync {
    /// Fetch the full item pool for an exam
    ///
    /// The returned items are snapshotted by the caller and never
    /// written back.
    async fn fetch_item_pool(&self, exam_id: &str) -> Result<Vec<Item>, ItemBankError>;
}

/// In-memory item bank
///
/// Pools are registered up front with [`InMemoryItemBank::insert_pool`].
/// `fail_next` makes the next fetch report the bank as unavailable,
/// which tests use to exercise infrastructure-failure paths.
#[derive(Default)]
pub struct InMemoryItemBank {
    pools: RwLock<HashMap<String, Vec<Item>>>,
    fail_next: AtomicBool,
}

impl InMemoryItemBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the pool for an exam
    pub async fn insert_pool(&self, exam_id: impl Into<String>, items: Vec<Item>) {
        self.pools.write().await.insert(exam_id.into(), items);
    }

    /// Make the next `fetch_item_pool` call fail with `Unavailable`
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemBank for InMemoryItemBank {
    async fn fetch_item_pool(&self, exam_id: &str) -> Result<Vec<Item>, ItemBankError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ItemBankError::Unavailable("injected failure".to_string()));
        }
        self.pools
            .read()
            .await
            .get(exam_id)
            .cloned()
            .ok_or_else(|| ItemBankError::UnknownExam(exam_id.to_string()))
    }
}
