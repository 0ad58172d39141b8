//! End-to-end adaptive exam flows through the coordinator

use std::sync::Arc;

use examind_core::{
    CatConfig, CoordinatorConfig, InMemoryItemBank, Item, MemoryEventBus, MemoryResultStore,
    SessionCoordinator, TerminationReason, ViolationKind,
};

struct Harness {
    coordinator: SessionCoordinator,
    store: Arc<MemoryResultStore>,
}

async fn harness(pool_size: usize, config: CoordinatorConfig) -> Harness {
    let bank = Arc::new(InMemoryItemBank::new());
    let items = (0..pool_size)
        .map(|i| Item::new(format!("q{i}"), 1.0 + (i as f64) * 9.0 / pool_size.max(1) as f64))
        .collect();
    bank.insert_pool("exam-1", items).await;

    let store = Arc::new(MemoryResultStore::new());
    let coordinator = SessionCoordinator::new(
        bank,
        Arc::clone(&store) as Arc<dyn examind_core::ResultStore>,
        Arc::new(MemoryEventBus::new(1024)),
        config,
    );
    Harness { coordinator, store }
}

/// Drive a session to its terminal state, answering with the given
/// correctness pattern, and return its id.
async fn run_session(h: &Harness, answers: impl Fn(usize) -> bool) -> String {
    let id = h.coordinator.start("exam-1", "examinee").await.unwrap();
    h.coordinator.device_ready(&id, true, true).await.unwrap();

    let mut n = 0;
    loop {
        let item = match h.coordinator.next_item(&id).await {
            Ok(item) => item,
            Err(_) => break, // terminal
        };
        h.coordinator
            .submit_answer(&id, &item.id, answers(n), 500)
            .await
            .unwrap();
        n += 1;
        assert!(n <= 1000, "session failed to terminate");
    }
    id
}

#[tokio::test]
async fn every_session_terminates_with_a_finite_pool() {
    let h = harness(12, CoordinatorConfig::default()).await;

    for pattern in 0..4u32 {
        let id = run_session(&h, move |n| (n as u32 + pattern) % 3 != 0).await;
        let record = h.coordinator.complete(&id).await.unwrap();
        assert!(record.termination_reason.is_completion());
        assert!(h.store.get(&id).await.is_some());
    }
}

#[tokio::test]
async fn standard_error_never_increases_within_a_session() {
    let h = harness(20, CoordinatorConfig::default()).await;
    let id = run_session(&h, |n| n % 2 == 0).await;

    let record = h.coordinator.complete(&id).await.unwrap();
    assert!(!record.responses.is_empty());
    for pair in record.responses.windows(2) {
        assert!(pair[1].standard_error_after <= pair[0].standard_error_after);
    }
}

#[tokio::test]
async fn no_item_is_ever_repeated() {
    let h = harness(20, CoordinatorConfig::default()).await;
    let id = run_session(&h, |_| true).await;

    let record = h.coordinator.complete(&id).await.unwrap();
    let mut ids: Vec<_> = record.responses.iter().map(|r| r.item_id.clone()).collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before);
}

#[tokio::test]
async fn correct_answers_push_ability_up() {
    let config = CoordinatorConfig {
        cat: CatConfig {
            max_items: 6,
            min_items: 6,
            ..CatConfig::default()
        },
        ..CoordinatorConfig::default()
    };
    let h = harness(20, config).await;
    let id = run_session(&h, |_| true).await;

    let record = h.coordinator.complete(&id).await.unwrap();
    let first = &record.responses[0];
    assert!(record.ability_estimate > first.ability_before);
    assert!(record.standard_error < 1.0);
}

#[tokio::test]
async fn pool_smaller_than_max_items_completes_exhausted() {
    let config = CoordinatorConfig {
        cat: CatConfig {
            max_items: 50,
            min_items: 50,
            ..CatConfig::default()
        },
        ..CoordinatorConfig::default()
    };
    let h = harness(3, config).await;
    let id = run_session(&h, |_| false).await;

    let record = h.coordinator.complete(&id).await.unwrap();
    assert_eq!(record.termination_reason, TerminationReason::PoolExhausted);
    assert_eq!(record.responses.len(), 3);
}

#[tokio::test]
async fn archived_record_carries_violations_and_seed() {
    let h = harness(20, CoordinatorConfig::default()).await;
    let id = h.coordinator.start("exam-1", "examinee").await.unwrap();
    h.coordinator.device_ready(&id, true, true).await.unwrap();

    h.coordinator
        .report_violation(&id, ViolationKind::FocusLoss, Some("alt-tab".to_string()))
        .await
        .unwrap();
    h.coordinator.cancel(&id).await.unwrap();

    let record = h.store.get(&id).await.unwrap();
    assert_eq!(record.violations.len(), 1);
    assert_eq!(record.violations[0].kind, ViolationKind::FocusLoss);
    assert_eq!(record.termination_reason, TerminationReason::Cancelled);

    // The archived seed replays the session's item selection.
    let selector_seed = record.selector_seed;
    let mut replay = examind_core::ItemSelector::new(
        selector_seed,
        examind_core::CatConfig::default().start_band_width,
    );
    let pool: Vec<Item> = (0..20)
        .map(|i| Item::new(format!("q{i}"), 1.0 + (i as f64) * 9.0 / 20.0))
        .collect();
    let first = replay
        .select_next(5.0, &std::collections::HashSet::new(), &pool, true)
        .unwrap();
    // No responses were recorded, so replaying selects what the first
    // issued item would have been; it must exist in the pool.
    assert!(pool.iter().any(|item| item.id == first.id));
}
