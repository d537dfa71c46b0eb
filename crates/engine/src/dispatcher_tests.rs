// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::{secs, timing, Fixture, Sleep};
use lh_core::TaskOutcome;
use std::sync::Arc;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn paced_dispatch_runs_every_task() {
    let f = Fixture::new(3).await;
    let mut pool = WorkerPool::new(
        f.runner(Arc::new(Sleep(secs(10))), timing()),
        3,
        f.signal.clone(),
    );
    let dispatcher = Dispatcher::new(3, secs(1));
    let start = Instant::now();

    let outcome = dispatcher.run(&mut pool, &f.signal.subscribe()).await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    // last task arrives at 2s and works for 10s
    assert_eq!(start.elapsed(), secs(12));
    let reports = pool.reports();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[2].task.0, "task-3");
    assert!(reports.iter().all(|r| r.outcome == TaskOutcome::Completed));
}

#[tokio::test(start_paused = true)]
async fn interrupt_stops_submission() {
    let f = Fixture::new(3).await;
    let mut pool = WorkerPool::new(
        f.runner(Arc::new(Sleep(secs(100))), timing()),
        5,
        f.signal.clone(),
    );
    let dispatcher = Dispatcher::new(5, secs(10));
    let signal = f.signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(secs(15)).await;
        signal.trigger();
    });

    let outcome = dispatcher.run(&mut pool, &f.signal.subscribe()).await;

    assert_eq!(outcome, DispatchOutcome::Interrupted { submitted: 2 });
    assert_eq!(pool.submitted(), 2);
}

#[tokio::test(start_paused = true)]
async fn interrupt_while_joining_returns_early() {
    let f = Fixture::new(3).await;
    let mut pool = WorkerPool::new(
        f.runner(Arc::new(Sleep(secs(100))), timing()),
        5,
        f.signal.clone(),
    );
    let dispatcher = Dispatcher::new(2, secs(1));
    let signal = f.signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(secs(30)).await;
        signal.trigger();
    });

    let outcome = dispatcher.run(&mut pool, &f.signal.subscribe()).await;

    assert_eq!(outcome, DispatchOutcome::Interrupted { submitted: 2 });
    assert_eq!(pool.shutdown(secs(3)).await, 0);
    assert!(pool
        .reports()
        .iter()
        .all(|r| r.outcome == TaskOutcome::Interrupted));
}

#[test]
fn dispatcher_reads_settings() {
    let settings = DispatchSettings::default();
    let dispatcher = Dispatcher::from_settings(&settings);
    assert_eq!(dispatcher.tasks, 5);
    assert_eq!(dispatcher.spacing, secs(1));
}
