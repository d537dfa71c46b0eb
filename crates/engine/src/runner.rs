// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task runner: drives one task through acquire, run and release

use crate::heartbeat::RenewalLog;
use crate::holder::{Acquisition, PermitHolder};
use crate::signal::Interrupt;
use crate::work::Work;
use lh_adapters::LeaseStore;
use lh_core::{Clock, PermitId, Task, TaskEvent, TaskId, TaskOutcome, TaskState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Terminal report for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task: TaskId,
    pub outcome: TaskOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit: Option<PermitId>,
    /// Abandon reason or release cause, for anything but a clean finish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub waited_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_ms: Option<u64>,
    pub renewals: RenewalLog,
}

impl TaskReport {
    fn from_task(task: &Task, permit: Option<PermitId>, renewals: RenewalLog) -> Self {
        let detail = match &task.state {
            TaskState::Abandoned { reason } => Some(reason.to_string()),
            TaskState::Failed { cause } => Some(cause.to_string()),
            _ => None,
        };
        let waited_until = task.acquired_at.or(task.finished_at);
        let waited = waited_until
            .map(|at| at.saturating_duration_since(task.created_at))
            .unwrap_or_default();

        TaskReport {
            task: task.id.clone(),
            // only called on terminal tasks
            outcome: task.outcome().unwrap_or(TaskOutcome::Failed),
            permit,
            detail,
            waited_ms: millis(waited),
            held_ms: task.held_for().map(millis),
            renewals,
        }
    }

    /// Report for a task whose worker ended without reporting
    pub fn lost(task: TaskId, outcome: TaskOutcome, detail: impl Into<String>) -> Self {
        TaskReport {
            task,
            outcome,
            permit: None,
            detail: Some(detail.into()),
            waited_ms: 0,
            held_ms: None,
            renewals: RenewalLog::default(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Runs tasks against one semaphore
pub struct TaskRunner<S: LeaseStore, W: Work + ?Sized, C: Clock> {
    holder: PermitHolder<S>,
    work: Arc<W>,
    clock: C,
    interrupt: Interrupt,
}

impl<S: LeaseStore, W: Work + ?Sized, C: Clock> TaskRunner<S, W, C> {
    pub fn new(holder: PermitHolder<S>, work: Arc<W>, clock: C, interrupt: Interrupt) -> Self {
        Self {
            holder,
            work,
            clock,
            interrupt,
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Run one task to a terminal state.
    ///
    /// Once a permit is acquired every path goes through release, whether
    /// the work completes, fails, overruns its lifetime, or is interrupted.
    pub async fn run(&self, id: TaskId) -> TaskReport {
        let mut task = Task::new(id, &self.clock);
        tracing::info!(task = %task.id, semaphore = %self.holder.semaphore(), "waiting for permit");

        let acquisition = tokio::select! {
            biased;
            _ = self.interrupt.triggered() => None,
            acquisition = self.holder.acquire() => Some(acquisition),
        };
        let permit = match acquisition {
            Some(Acquisition::Acquired(permit)) => permit,
            Some(Acquisition::NoSlot) => return self.abandon(task, TaskEvent::NoSlot),
            Some(Acquisition::Unavailable(e)) => {
                let event = TaskEvent::StoreUnavailable {
                    reason: e.to_string(),
                };
                return self.abandon(task, event);
            }
            None => return self.abandon(task, TaskEvent::Interrupted),
        };

        let permit_id = permit.id.clone();
        self.apply(
            &mut task,
            TaskEvent::Acquired {
                permit: permit_id.clone(),
            },
        );
        let mut held = self.holder.hold(permit);

        let ended = match self.holder.keep_alive(&mut held) {
            Ok(()) => {
                self.apply(&mut task, TaskEvent::HeartbeatRegistered);
                self.work_until_done(&task.id).await
            }
            Err(e) => TaskEvent::HeartbeatUnavailable {
                reason: e.to_string(),
            },
        };
        self.apply(&mut task, ended);

        let renewals = held.release().await;
        self.apply(&mut task, TaskEvent::Released);

        TaskReport::from_task(&task, Some(permit_id), renewals)
    }

    /// Report for a task interrupted before it could start waiting
    pub fn interrupted_before_start(&self, id: TaskId) -> TaskReport {
        let task = Task::new(id, &self.clock);
        self.abandon(task, TaskEvent::Interrupted)
    }

    async fn work_until_done(&self, id: &TaskId) -> TaskEvent {
        let max_lifetime = self.holder.timing().max_lifetime;
        let lifetime = async {
            match max_lifetime {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.interrupt.triggered() => TaskEvent::Interrupted,
            _ = lifetime => TaskEvent::LifetimeExceeded,
            result = self.work.run(id) => match result {
                Ok(()) => TaskEvent::WorkCompleted,
                Err(e) => TaskEvent::WorkFailed { reason: e.to_string() },
            },
        }
    }

    fn abandon(&self, mut task: Task, event: TaskEvent) -> TaskReport {
        self.apply(&mut task, event);
        TaskReport::from_task(&task, None, RenewalLog::default())
    }

    fn apply(&self, task: &mut Task, event: TaskEvent) {
        let (next, events) = task.transition(event, &self.clock);
        for event in &events {
            event.log();
        }
        *task = next;
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
