// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the lease table and the task state machine

use crate::permit::{PermitId, SemaphoreId};
use crate::task::{AbandonReason, ReleaseCause, TaskId};

/// Something observable happened to a permit or a task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    // Store-side permit events
    PermitGranted {
        semaphore: SemaphoreId,
        permit: PermitId,
        available: u32,
    },
    PermitDenied {
        semaphore: SemaphoreId,
        capacity: u32,
    },
    PermitRenewed {
        semaphore: SemaphoreId,
        permit: PermitId,
    },
    PermitRenewRejected {
        semaphore: SemaphoreId,
        permit: PermitId,
    },
    PermitReleased {
        semaphore: SemaphoreId,
        permit: PermitId,
        available: u32,
    },
    PermitExpired {
        semaphore: SemaphoreId,
        permit: PermitId,
    },

    // Task lifecycle events
    TaskAcquired {
        id: TaskId,
        permit: PermitId,
    },
    TaskRunning {
        id: TaskId,
    },
    TaskReleasing {
        id: TaskId,
        cause: ReleaseCause,
    },
    TaskDone {
        id: TaskId,
    },
    TaskAbandoned {
        id: TaskId,
        reason: AbandonReason,
    },
    TaskFailed {
        id: TaskId,
        cause: ReleaseCause,
    },
}

impl Event {
    /// Stable name used as the log message and for filtering
    pub fn name(&self) -> &'static str {
        match self {
            Event::PermitGranted { .. } => "permit:granted",
            Event::PermitDenied { .. } => "permit:denied",
            Event::PermitRenewed { .. } => "permit:renewed",
            Event::PermitRenewRejected { .. } => "permit:renew_rejected",
            Event::PermitReleased { .. } => "permit:released",
            Event::PermitExpired { .. } => "permit:expired",
            Event::TaskAcquired { .. } => "task:acquired",
            Event::TaskRunning { .. } => "task:running",
            Event::TaskReleasing { .. } => "task:releasing",
            Event::TaskDone { .. } => "task:done",
            Event::TaskAbandoned { .. } => "task:abandoned",
            Event::TaskFailed { .. } => "task:failed",
        }
    }

    /// Emit this event through `tracing` at a level matching its severity
    pub fn log(&self) {
        let name = self.name();
        match self {
            Event::PermitGranted {
                semaphore,
                permit,
                available,
            } => tracing::debug!(%semaphore, %permit, available, "{}", name),
            Event::PermitDenied {
                semaphore,
                capacity,
            } => tracing::debug!(%semaphore, capacity, "{}", name),
            Event::PermitRenewed { semaphore, permit } => {
                tracing::trace!(%semaphore, %permit, "{}", name)
            }
            Event::PermitRenewRejected { semaphore, permit } => {
                tracing::warn!(%semaphore, %permit, "{}", name)
            }
            Event::PermitReleased {
                semaphore,
                permit,
                available,
            } => tracing::debug!(%semaphore, %permit, available, "{}", name),
            Event::PermitExpired { semaphore, permit } => {
                tracing::warn!(%semaphore, %permit, "{}", name)
            }
            Event::TaskAcquired { id, permit } => tracing::info!(task = %id, %permit, "{}", name),
            Event::TaskRunning { id } => tracing::info!(task = %id, "{}", name),
            Event::TaskReleasing { id, cause } => tracing::info!(task = %id, %cause, "{}", name),
            Event::TaskDone { id } => tracing::info!(task = %id, "{}", name),
            Event::TaskAbandoned { id, reason } => tracing::warn!(task = %id, %reason, "{}", name),
            Event::TaskFailed { id, cause } => tracing::warn!(task = %id, %cause, "{}", name),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
