// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One complete batch: set capacity, dispatch, shut down

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::heartbeat::{HeartbeatScheduler, HeartbeatStats};
use crate::holder::PermitHolder;
use crate::pool::WorkerPool;
use crate::runner::{TaskReport, TaskRunner};
use crate::shutdown::{ShutdownCoordinator, ShutdownReport};
use crate::signal::ShutdownSignal;
use crate::work::Work;
use lh_adapters::{CapacityAck, LeaseStore, StoreError};
use lh_core::{SemaphoreId, Settings, SystemClock, TaskOutcome};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;

/// Number of tasks per terminal outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub completed: usize,
    pub no_slot: usize,
    pub store_unavailable: usize,
    pub failed: usize,
    pub interrupted: usize,
}

impl OutcomeCounts {
    pub fn tally(reports: &[TaskReport]) -> Self {
        let mut counts = Self::default();
        for report in reports {
            let slot = match report.outcome {
                TaskOutcome::Completed => &mut counts.completed,
                TaskOutcome::NoSlot => &mut counts.no_slot,
                TaskOutcome::StoreUnavailable => &mut counts.store_unavailable,
                TaskOutcome::Failed => &mut counts.failed,
                TaskOutcome::Interrupted => &mut counts.interrupted,
            };
            *slot += 1;
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.completed + self.no_slot + self.store_unavailable + self.failed + self.interrupted
    }
}

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub semaphore: SemaphoreId,
    /// Capacity in effect (an existing value wins over the configured one)
    pub capacity: u32,
    pub interrupted: bool,
    pub counts: OutcomeCounts,
    pub tasks: Vec<TaskReport>,
    pub heartbeats: HeartbeatStats,
    pub shutdown: ShutdownReport,
    pub elapsed_ms: u64,
}

/// Run one batch of tasks against `store` and shut everything down.
///
/// Fails only if the capacity cannot be set; the store is closed either way.
/// Task-level failures are reported in the summary.
pub async fn run_batch<S, W>(
    settings: &Settings,
    store: S,
    work: Arc<W>,
    signal: ShutdownSignal,
) -> Result<RunSummary, StoreError>
where
    S: LeaseStore,
    W: Work + ?Sized,
{
    let start = Instant::now();
    let semaphore = settings.semaphore.id.clone();

    let capacity = match store.set_capacity(&semaphore, settings.semaphore.capacity).await {
        Ok(CapacityAck::Initialized) => settings.semaphore.capacity,
        Ok(CapacityAck::AlreadySet { capacity }) => {
            if capacity != settings.semaphore.capacity {
                tracing::warn!(
                    %semaphore,
                    existing = capacity,
                    configured = settings.semaphore.capacity,
                    "capacity already set, keeping existing value"
                );
            }
            capacity
        }
        Err(e) => {
            tracing::error!(%semaphore, error = %e, "could not set capacity");
            if let Err(close) = store.close().await {
                tracing::warn!(error = %close, "store close failed");
            }
            return Err(e);
        }
    };
    tracing::info!(
        %semaphore,
        capacity,
        tasks = settings.dispatch.tasks,
        renewal_slack = settings.lease.renewal_slack(),
        "run starting"
    );

    let heartbeats = HeartbeatScheduler::start(store.clone(), settings.pool.heartbeat_workers);
    let holder = PermitHolder::new(
        store.clone(),
        heartbeats.clone(),
        semaphore.clone(),
        settings.lease.clone(),
    );
    let interrupt = signal.subscribe();
    let runner = TaskRunner::new(holder, work, SystemClock, interrupt.clone());
    let mut pool = WorkerPool::new(runner, settings.pool.workers, signal);

    let outcome = Dispatcher::from_settings(&settings.dispatch)
        .run(&mut pool, &interrupt)
        .await;

    let shutdown = ShutdownCoordinator::new(settings.shutdown.clone())
        .shutdown(&mut pool, &heartbeats, &store)
        .await;

    let tasks = pool.reports();
    let counts = OutcomeCounts::tally(&tasks);
    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        completed = counts.completed,
        no_slot = counts.no_slot,
        store_unavailable = counts.store_unavailable,
        failed = counts.failed,
        interrupted = counts.interrupted,
        elapsed_ms,
        "run finished"
    );

    Ok(RunSummary {
        semaphore,
        capacity,
        interrupted: matches!(outcome, DispatchOutcome::Interrupted { .. }),
        counts,
        tasks,
        heartbeats: heartbeats.stats(),
        shutdown,
        elapsed_ms,
    })
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
