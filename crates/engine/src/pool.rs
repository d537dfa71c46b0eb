// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool for tasks

use crate::error::SchedulerError;
use crate::runner::{TaskReport, TaskRunner};
use crate::signal::ShutdownSignal;
use crate::work::Work;
use lh_adapters::LeaseStore;
use lh_core::{Clock, TaskId, TaskOutcome};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs at most `workers` tasks at once; the rest queue.
///
/// Every submitted task is tracked until it reports, so [`WorkerPool::join`]
/// returns only once all of them are terminal.
pub struct WorkerPool<S: LeaseStore, W: Work + ?Sized, C: Clock> {
    runner: Arc<TaskRunner<S, W, C>>,
    slots: Arc<Semaphore>,
    signal: ShutdownSignal,
    tasks: JoinSet<TaskReport>,
    /// Submitted tasks that have not reported yet
    unfinished: Arc<Mutex<HashSet<TaskId>>>,
    submitted: Vec<TaskId>,
    reports: Vec<TaskReport>,
    accepting: bool,
}

impl<S: LeaseStore, W: Work + ?Sized, C: Clock> WorkerPool<S, W, C> {
    /// `signal` must be the one `runner`'s interrupt was subscribed from
    pub fn new(runner: TaskRunner<S, W, C>, workers: usize, signal: ShutdownSignal) -> Self {
        Self {
            runner: Arc::new(runner),
            slots: Arc::new(Semaphore::new(workers.max(1))),
            signal,
            tasks: JoinSet::new(),
            unfinished: Arc::new(Mutex::new(HashSet::new())),
            submitted: Vec::new(),
            reports: Vec::new(),
            accepting: true,
        }
    }

    fn unfinished(&self) -> std::sync::MutexGuard<'_, HashSet<TaskId>> {
        self.unfinished.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a task. Fails once shutdown has begun.
    pub fn submit(&mut self, id: impl Into<TaskId>) -> Result<(), SchedulerError> {
        if !self.accepting || self.signal.is_triggered() {
            return Err(SchedulerError::PoolClosed);
        }
        let id = id.into();
        self.submitted.push(id.clone());
        self.unfinished().insert(id.clone());
        tracing::debug!(task = %id, "task submitted");

        let runner = Arc::clone(&self.runner);
        let slots = Arc::clone(&self.slots);
        let unfinished = Arc::clone(&self.unfinished);
        self.tasks.spawn(async move {
            let report = tokio::select! {
                biased;
                _ = runner.interrupt().triggered() => runner.interrupted_before_start(id.clone()),
                slot = slots.acquire_owned() => match slot {
                    Ok(_slot) => runner.run(id.clone()).await,
                    Err(_) => runner.interrupted_before_start(id.clone()),
                },
            };
            unfinished
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
            report
        });
        Ok(())
    }

    /// Wait until every submitted task has reported. Cancel-safe.
    pub async fn join(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(report) => self.reports.push(report),
                Err(e) if e.is_panic() => tracing::error!(error = %e, "task worker panicked"),
                Err(e) => tracing::debug!(error = %e, "task worker cancelled"),
            }
        }
        self.settle_unfinished(TaskOutcome::Failed, "worker panicked");
    }

    /// Stop accepting tasks, interrupt running ones, and wait up to `grace`.
    ///
    /// Returns how many tasks were still running when the grace period ran
    /// out; those are aborted and reported as interrupted.
    pub async fn shutdown(&mut self, grace: Duration) -> usize {
        self.accepting = false;
        self.signal.trigger();

        if tokio::time::timeout(grace, self.join()).await.is_ok() {
            return 0;
        }

        let abandoned = self.tasks.len();
        tracing::warn!(abandoned, ?grace, "task grace period elapsed, aborting tasks");
        self.tasks.shutdown().await;
        self.settle_unfinished(TaskOutcome::Interrupted, "aborted after grace period");
        abandoned
    }

    fn settle_unfinished(&mut self, outcome: TaskOutcome, detail: &str) {
        let lost: Vec<TaskId> = self.unfinished().drain().collect();
        for id in lost {
            tracing::warn!(task = %id, %outcome, detail, "task ended without a report");
            self.reports.push(TaskReport::lost(id, outcome, detail));
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting && !self.signal.is_triggered()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.len()
    }

    /// Tasks submitted but not yet reported
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Reports collected so far, in submission order
    pub fn reports(&self) -> Vec<TaskReport> {
        let mut reports = self.reports.clone();
        reports.sort_by_key(|r| {
            self.submitted
                .iter()
                .position(|id| *id == r.task)
                .unwrap_or(usize::MAX)
        });
        reports
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
