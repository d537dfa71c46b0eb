// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-phase shutdown: tasks, then heartbeats, then the store
//!
//! Order matters. Closing the store before tasks release would orphan their
//! permits until expiry; stopping heartbeats first would let leases lapse
//! under work still in progress. Each phase is bounded by its own grace
//! period, and a phase that fails or times out never blocks the next.

use crate::heartbeat::HeartbeatScheduler;
use crate::pool::WorkerPool;
use crate::work::Work;
use lh_adapters::LeaseStore;
use lh_core::{Clock, ShutdownSettings};
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Tasks,
    Heartbeats,
    Store,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Tasks => write!(f, "tasks"),
            Phase::Heartbeats => write!(f, "heartbeats"),
            Phase::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Clean,
    /// Grace period ran out with `abandoned` units still running
    TimedOut { abandoned: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    #[serde(flatten)]
    pub status: PhaseStatus,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub phases: Vec<PhaseReport>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.phases.iter().all(|p| p.status == PhaseStatus::Clean)
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    fn record(&mut self, phase: Phase, status: PhaseStatus, start: Instant) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &status {
            PhaseStatus::Clean => tracing::info!(%phase, elapsed_ms, "shutdown phase complete"),
            PhaseStatus::TimedOut { abandoned } => tracing::warn!(
                %phase,
                elapsed_ms,
                abandoned,
                "shutdown phase timed out, continuing"
            ),
            PhaseStatus::Failed { reason } => tracing::error!(
                %phase,
                elapsed_ms,
                reason,
                "shutdown phase failed, continuing"
            ),
        }
        self.phases.push(PhaseReport {
            phase,
            status,
            elapsed_ms,
        });
    }
}

fn timed(abandoned: usize) -> PhaseStatus {
    if abandoned == 0 {
        PhaseStatus::Clean
    } else {
        PhaseStatus::TimedOut { abandoned }
    }
}

pub struct ShutdownCoordinator {
    settings: ShutdownSettings,
}

impl ShutdownCoordinator {
    pub fn new(settings: ShutdownSettings) -> Self {
        Self { settings }
    }

    /// Drain the pool, stop heartbeats, close the store. Always runs all three.
    pub async fn shutdown<S, W, C>(
        &self,
        pool: &mut WorkerPool<S, W, C>,
        heartbeats: &HeartbeatScheduler,
        store: &S,
    ) -> ShutdownReport
    where
        S: LeaseStore,
        W: Work + ?Sized,
        C: Clock,
    {
        let mut report = ShutdownReport::default();
        tracing::info!("shutting down");

        let start = Instant::now();
        let abandoned = pool.shutdown(self.settings.task_grace).await;
        report.record(Phase::Tasks, timed(abandoned), start);

        let start = Instant::now();
        let abandoned = heartbeats.shutdown(self.settings.heartbeat_grace).await;
        report.record(Phase::Heartbeats, timed(abandoned), start);

        let start = Instant::now();
        let status = match tokio::time::timeout(self.settings.store_grace, store.close()).await {
            Ok(Ok(())) => PhaseStatus::Clean,
            Ok(Err(e)) => PhaseStatus::Failed {
                reason: e.to_string(),
            },
            Err(_) => PhaseStatus::TimedOut { abandoned: 0 },
        };
        report.record(Phase::Store, status, start);

        report
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
