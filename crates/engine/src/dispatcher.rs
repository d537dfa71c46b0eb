// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submits a batch of tasks with paced arrival

use crate::pool::WorkerPool;
use crate::signal::Interrupt;
use crate::work::Work;
use lh_adapters::LeaseStore;
use lh_core::{Clock, DispatchSettings};
use std::time::Duration;

/// How a dispatch run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every task was submitted and reached a terminal state
    Completed,
    /// Interrupted; remaining tasks are left to shutdown
    Interrupted { submitted: usize },
}

pub struct Dispatcher {
    tasks: usize,
    spacing: Duration,
}

impl Dispatcher {
    pub fn new(tasks: usize, spacing: Duration) -> Self {
        Self { tasks, spacing }
    }

    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self::new(settings.tasks, settings.spacing)
    }

    /// Submit `task-1..task-N`, `spacing` apart, then wait for all of them
    pub async fn run<S, W, C>(
        &self,
        pool: &mut WorkerPool<S, W, C>,
        interrupt: &Interrupt,
    ) -> DispatchOutcome
    where
        S: LeaseStore,
        W: Work + ?Sized,
        C: Clock,
    {
        for n in 1..=self.tasks {
            if let Err(e) = pool.submit(format!("task-{}", n)) {
                tracing::warn!(error = %e, submitted = n - 1, "dispatch stopped");
                return DispatchOutcome::Interrupted { submitted: n - 1 };
            }
            if n < self.tasks {
                tokio::select! {
                    biased;
                    _ = interrupt.triggered() => {
                        tracing::info!(submitted = n, "dispatch interrupted");
                        return DispatchOutcome::Interrupted { submitted: n };
                    }
                    _ = tokio::time::sleep(self.spacing) => {}
                }
            }
        }

        tracing::info!(tasks = self.tasks, "all tasks submitted, waiting for completion");
        tokio::select! {
            biased;
            _ = interrupt.triggered() => {
                tracing::info!("interrupted while waiting for tasks");
                DispatchOutcome::Interrupted { submitted: self.tasks }
            }
            _ = pool.join() => DispatchOutcome::Completed,
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
