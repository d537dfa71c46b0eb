// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::{secs, sem, Sleep, Tracked};
use crate::work::SimulatedWork;
use lh_adapters::{FakeLeaseStore, StoreCall};
use std::time::Duration;

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.semaphore.id = sem();
    settings
}

#[tokio::test(start_paused = true)]
async fn five_staggered_tasks_never_exceed_capacity_two() {
    let mut settings = settings();
    // long enough that nobody gives up waiting
    settings.lease.max_wait = secs(600);
    let store = FakeLeaseStore::new();
    let work = Arc::new(Tracked::new(SimulatedWork::from_settings(&settings.dispatch)));

    let summary = run_batch(&settings, store.clone(), Arc::clone(&work), ShutdownSignal::new())
        .await
        .unwrap();

    assert!(work.gauge.peak() <= 2, "peak {}", work.gauge.peak());
    assert_eq!(work.gauge.finished(), 5);
    assert_eq!(summary.counts.completed, 5);
    assert_eq!(summary.tasks.len(), 5);
    assert!(!summary.interrupted);
    assert!(summary.shutdown.is_clean());
    assert_eq!(store.releases().len(), 5);
    assert_eq!(store.calls().last(), Some(&StoreCall::Close));
    assert_eq!(summary.heartbeats.active, 0);
}

#[tokio::test(start_paused = true)]
async fn late_arrivals_give_up_after_max_wait_without_releasing() {
    let settings = settings();
    let store = FakeLeaseStore::new();

    let summary = run_batch(&settings, store.clone(), Arc::new(Sleep(secs(100))), ShutdownSignal::new())
        .await
        .unwrap();

    assert_eq!(summary.counts.completed, 2);
    assert_eq!(summary.counts.no_slot, 3);
    for report in &summary.tasks[2..] {
        assert_eq!(report.outcome, TaskOutcome::NoSlot);
        assert_eq!(report.waited_ms, 60_000);
        assert!(report.permit.is_none());
    }
    assert_eq!(store.releases().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn crashed_holder_slot_is_reclaimed_after_ttl() {
    let mut settings = settings();
    settings.semaphore.capacity = 1;
    settings.dispatch.tasks = 1;
    settings.lease.max_wait = secs(300);
    let store = FakeLeaseStore::new();

    // another process takes the only slot and dies without cleanup
    store.set_capacity(&sem(), 1).await.unwrap();
    let crashed = store
        .acquire(&sem(), Duration::ZERO, settings.lease.ttl)
        .await
        .unwrap()
        .unwrap();

    let summary = run_batch(&settings, store.clone(), Arc::new(Sleep(secs(10))), ShutdownSignal::new())
        .await
        .unwrap();

    let report = &summary.tasks[0];
    assert_eq!(report.outcome, TaskOutcome::Completed);
    assert!(report.waited_ms <= settings.lease.ttl.as_millis() as u64);
    assert_ne!(report.permit.as_ref(), Some(&crashed.id));
    assert!(!store.releases().contains(&crashed.id));
}

#[tokio::test(start_paused = true)]
async fn existing_capacity_is_kept() {
    let settings = settings();
    let store = FakeLeaseStore::new();
    store.set_capacity(&sem(), 1).await.unwrap();
    let work = Arc::new(Tracked::new(Sleep(secs(10))));

    let summary = run_batch(&settings, store, Arc::clone(&work), ShutdownSignal::new())
        .await
        .unwrap();

    assert_eq!(summary.capacity, 1);
    assert_eq!(work.gauge.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn interrupt_drains_every_task() {
    let settings = settings();
    let store = FakeLeaseStore::new();
    let signal = ShutdownSignal::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(secs(30)).await;
        trigger.trigger();
    });

    let summary = run_batch(&settings, store.clone(), Arc::new(Sleep(secs(100))), signal)
        .await
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.counts.interrupted, 5);
    assert_eq!(summary.counts.total(), 5);
    assert!(summary.shutdown.is_clean());
    // only the two holders release
    assert_eq!(store.releases().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn capacity_failure_aborts_the_run() {
    let settings = settings();
    let store = FakeLeaseStore::new();
    store.backing().close().await.unwrap();

    let err = run_batch(&settings, store.clone(), Arc::new(Sleep(secs(1))), ShutdownSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::Closed);
    assert_eq!(store.calls().last(), Some(&StoreCall::Close));
}

#[tokio::test(start_paused = true)]
async fn summary_serializes_to_json() {
    let mut settings = settings();
    settings.dispatch.tasks = 1;
    let summary = run_batch(&settings, FakeLeaseStore::new(), Arc::new(Sleep(secs(1))), ShutdownSignal::new())
        .await
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["semaphore"], "host:192.168.1.1:script-100");
    assert_eq!(json["capacity"], 2);
    assert_eq!(json["counts"]["completed"], 1);
    assert_eq!(json["tasks"][0]["outcome"], "completed");
    assert_eq!(json["shutdown"]["phases"][2]["phase"], "store");
    assert_eq!(json["shutdown"]["phases"][2]["status"], "clean");
}

#[test]
fn tally_counts_each_outcome() {
    let reports = vec![
        TaskReport::lost("a".into(), TaskOutcome::Failed, "x"),
        TaskReport::lost("b".into(), TaskOutcome::NoSlot, "x"),
        TaskReport::lost("c".into(), TaskOutcome::NoSlot, "x"),
    ];
    let counts = OutcomeCounts::tally(&reports);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.no_slot, 2);
    assert_eq!(counts.total(), 3);
}
