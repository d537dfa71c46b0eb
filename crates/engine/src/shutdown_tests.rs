// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::{secs, timing, Fixture, Sleep};
use lh_adapters::{FakeLeaseStore, StoreCall, StoreError};
use lh_core::{SystemClock, TaskOutcome};
use std::sync::Arc;

fn settings() -> ShutdownSettings {
    ShutdownSettings {
        task_grace: secs(3),
        heartbeat_grace: secs(3),
        store_grace: secs(3),
    }
}

fn pool(f: &Fixture, work: Sleep) -> WorkerPool<FakeLeaseStore, Sleep, SystemClock> {
    WorkerPool::new(f.runner(Arc::new(work), timing()), 5, f.signal.clone())
}

#[tokio::test(start_paused = true)]
async fn phases_run_in_order_and_release_before_close() {
    let f = Fixture::new(2).await;
    let mut pool = pool(&f, Sleep(secs(100)));
    pool.submit("task-1").unwrap();
    pool.submit("task-2").unwrap();
    tokio::time::sleep(secs(25)).await;

    let report = ShutdownCoordinator::new(settings())
        .shutdown(&mut pool, &f.heartbeats, &f.store)
        .await;

    assert!(report.is_clean(), "{:?}", report);
    let phases: Vec<_> = report.phases.iter().map(|p| p.phase).collect();
    assert_eq!(phases, [Phase::Tasks, Phase::Heartbeats, Phase::Store]);

    // both permits released, then no renewals, then close
    let calls = f.store.calls();
    let close_at = calls.iter().position(|c| *c == StoreCall::Close).unwrap();
    let last_release = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::Release { .. }))
        .unwrap();
    let last_renew = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::Renew { .. }))
        .unwrap();
    assert!(last_renew < last_release && last_release < close_at);
    assert_eq!(f.store.releases().len(), 2);
    assert!(pool
        .reports()
        .iter()
        .all(|r| r.outcome == TaskOutcome::Interrupted));
    assert!(f.heartbeats.is_stopped());
}

#[tokio::test(start_paused = true)]
async fn timed_out_phase_does_not_block_the_rest() {
    let f = Fixture::new(2).await;
    f.store.delay_releases(secs(60));
    let mut pool = pool(&f, Sleep(secs(100)));
    pool.submit("task-1").unwrap();
    tokio::time::sleep(secs(5)).await;

    let report = ShutdownCoordinator::new(settings())
        .shutdown(&mut pool, &f.heartbeats, &f.store)
        .await;

    let tasks = report.phase(Phase::Tasks).unwrap();
    assert_eq!(tasks.status, PhaseStatus::TimedOut { abandoned: 1 });
    assert_eq!(tasks.elapsed_ms, 3_000);
    assert_eq!(
        report.phase(Phase::Heartbeats).unwrap().status,
        PhaseStatus::Clean
    );
    assert_eq!(report.phase(Phase::Store).unwrap().status, PhaseStatus::Clean);
    assert!(!report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn store_close_failure_is_reported() {
    let f = Fixture::new(2).await;
    f.store
        .fail_close(StoreError::ConnectionLost("broken pipe".into()));
    let mut pool = pool(&f, Sleep(secs(1)));

    let report = ShutdownCoordinator::new(settings())
        .shutdown(&mut pool, &f.heartbeats, &f.store)
        .await;

    assert_eq!(report.phases.len(), 3);
    assert_eq!(
        report.phase(Phase::Store).unwrap().status,
        PhaseStatus::Failed {
            reason: "store connection lost: broken pipe".into()
        }
    );
}

#[test]
fn phase_report_serializes_flat() {
    let report = PhaseReport {
        phase: Phase::Heartbeats,
        status: PhaseStatus::TimedOut { abandoned: 2 },
        elapsed_ms: 3000,
    };
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["phase"], "heartbeats");
    assert_eq!(json["status"], "timed_out");
    assert_eq!(json["abandoned"], 2);
    assert_eq!(json["elapsed_ms"], 3000);
}
