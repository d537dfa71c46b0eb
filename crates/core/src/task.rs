// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task state machine
//!
//! A task is one unit of work that needs a permit. Every path that reaches
//! `HoldingPermit` or `Running` leaves through `Releasing`, so a permit the
//! task believes it holds is never dropped without a release attempt.
//!
//! ```text
//! WaitingForPermit ──acquired──▶ HoldingPermit ──heartbeat──▶ Running
//!        │                             │                         │
//!   no slot / fault /             interrupted /        done / error / interrupted
//!   interrupted                   no heartbeat                   │
//!        ▼                             └──────────▶ Releasing ◀──┘
//!    Abandoned                                          │ released
//!                                                       ▼
//!                                                 Done | Failed
//! ```

use crate::clock::Clock;
use crate::event::Event;
use crate::permit::PermitId;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// Why a task holding a permit is releasing it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseCause {
    Completed,
    WorkFailed(String),
    /// Work outlived the configured lease lifetime
    LifetimeExceeded,
    /// The heartbeat could not be registered
    HeartbeatUnavailable(String),
    Interrupted,
}

impl std::fmt::Display for ReleaseCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseCause::Completed => write!(f, "completed"),
            ReleaseCause::WorkFailed(reason) => write!(f, "work failed: {}", reason),
            ReleaseCause::LifetimeExceeded => write!(f, "lease lifetime exceeded"),
            ReleaseCause::HeartbeatUnavailable(reason) => {
                write!(f, "heartbeat unavailable: {}", reason)
            }
            ReleaseCause::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Why a task never got to hold a permit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbandonReason {
    /// `max_wait` elapsed with no free slot
    NoSlot,
    /// The store could not be reached
    StoreUnavailable(String),
    Interrupted,
}

impl std::fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbandonReason::NoSlot => write!(f, "no slot within max wait"),
            AbandonReason::StoreUnavailable(reason) => write!(f, "store unavailable: {}", reason),
            AbandonReason::Interrupted => write!(f, "interrupted while waiting"),
        }
    }
}

/// The state of a task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    WaitingForPermit,
    HoldingPermit,
    Running,
    Releasing { cause: ReleaseCause },
    Done,
    Abandoned { reason: AbandonReason },
    Failed { cause: ReleaseCause },
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::WaitingForPermit => write!(f, "waiting_for_permit"),
            TaskState::HoldingPermit => write!(f, "holding_permit"),
            TaskState::Running => write!(f, "running"),
            TaskState::Releasing { .. } => write!(f, "releasing"),
            TaskState::Done => write!(f, "done"),
            TaskState::Abandoned { .. } => write!(f, "abandoned"),
            TaskState::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// Events that can change task state
#[derive(Clone, Debug)]
pub enum TaskEvent {
    Acquired { permit: PermitId },
    NoSlot,
    StoreUnavailable { reason: String },
    HeartbeatRegistered,
    HeartbeatUnavailable { reason: String },
    WorkCompleted,
    WorkFailed { reason: String },
    LifetimeExceeded,
    Interrupted,
    /// Heartbeat cancelled and release attempted
    Released,
}

/// Terminal result as reported to the operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed,
    NoSlot,
    StoreUnavailable,
    Failed,
    Interrupted,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::NoSlot => "no_slot",
            TaskOutcome::StoreUnavailable => "store_unavailable",
            TaskOutcome::Failed => "failed",
            TaskOutcome::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task and the permit it currently believes it holds
#[derive(Clone, Debug)]
pub struct Task {
    pub id: TaskId,
    pub state: TaskState,
    pub permit: Option<PermitId>,
    pub created_at: Instant,
    pub acquired_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl Task {
    /// Create a new task waiting for a permit
    pub fn new(id: impl Into<TaskId>, clock: &impl Clock) -> Self {
        Task {
            id: id.into(),
            state: TaskState::WaitingForPermit,
            permit: None,
            created_at: clock.now(),
            acquired_at: None,
            finished_at: None,
        }
    }

    /// Pure transition function - returns new state and events
    pub fn transition(&self, event: TaskEvent, clock: &impl Clock) -> (Task, Vec<Event>) {
        let now = clock.now();

        match (&self.state, event) {
            // WaitingForPermit → HoldingPermit
            (TaskState::WaitingForPermit, TaskEvent::Acquired { permit }) => {
                let task = Task {
                    state: TaskState::HoldingPermit,
                    permit: Some(permit.clone()),
                    acquired_at: Some(now),
                    ..self.clone()
                };
                let events = vec![Event::TaskAcquired {
                    id: self.id.clone(),
                    permit,
                }];
                (task, events)
            }

            // WaitingForPermit → Abandoned (nothing held, nothing to release)
            (TaskState::WaitingForPermit, TaskEvent::NoSlot) => {
                self.abandon(AbandonReason::NoSlot, now)
            }
            (TaskState::WaitingForPermit, TaskEvent::StoreUnavailable { reason }) => {
                self.abandon(AbandonReason::StoreUnavailable(reason), now)
            }
            (TaskState::WaitingForPermit, TaskEvent::Interrupted) => {
                self.abandon(AbandonReason::Interrupted, now)
            }

            // HoldingPermit → Running
            (TaskState::HoldingPermit, TaskEvent::HeartbeatRegistered) => {
                let task = Task {
                    state: TaskState::Running,
                    ..self.clone()
                };
                let events = vec![Event::TaskRunning {
                    id: self.id.clone(),
                }];
                (task, events)
            }

            // HoldingPermit → Releasing
            (TaskState::HoldingPermit, TaskEvent::HeartbeatUnavailable { reason }) => {
                self.begin_release(ReleaseCause::HeartbeatUnavailable(reason))
            }
            (TaskState::HoldingPermit, TaskEvent::Interrupted) => {
                self.begin_release(ReleaseCause::Interrupted)
            }

            // Running → Releasing
            (TaskState::Running, TaskEvent::WorkCompleted) => {
                self.begin_release(ReleaseCause::Completed)
            }
            (TaskState::Running, TaskEvent::WorkFailed { reason }) => {
                self.begin_release(ReleaseCause::WorkFailed(reason))
            }
            (TaskState::Running, TaskEvent::LifetimeExceeded) => {
                self.begin_release(ReleaseCause::LifetimeExceeded)
            }
            (TaskState::Running, TaskEvent::Interrupted) => {
                self.begin_release(ReleaseCause::Interrupted)
            }

            // Releasing → Done | Failed
            (TaskState::Releasing { cause }, TaskEvent::Released) => {
                let (state, event) = match cause {
                    ReleaseCause::Completed => (
                        TaskState::Done,
                        Event::TaskDone {
                            id: self.id.clone(),
                        },
                    ),
                    cause => (
                        TaskState::Failed {
                            cause: cause.clone(),
                        },
                        Event::TaskFailed {
                            id: self.id.clone(),
                            cause: cause.clone(),
                        },
                    ),
                };
                let task = Task {
                    state,
                    permit: None,
                    finished_at: Some(now),
                    ..self.clone()
                };
                (task, vec![event])
            }

            // Invalid transitions - no change
            _ => (self.clone(), vec![]),
        }
    }

    fn abandon(&self, reason: AbandonReason, now: Instant) -> (Task, Vec<Event>) {
        let task = Task {
            state: TaskState::Abandoned {
                reason: reason.clone(),
            },
            finished_at: Some(now),
            ..self.clone()
        };
        let events = vec![Event::TaskAbandoned {
            id: self.id.clone(),
            reason,
        }];
        (task, events)
    }

    fn begin_release(&self, cause: ReleaseCause) -> (Task, Vec<Event>) {
        let task = Task {
            state: TaskState::Releasing {
                cause: cause.clone(),
            },
            ..self.clone()
        };
        let events = vec![Event::TaskReleasing {
            id: self.id.clone(),
            cause,
        }];
        (task, events)
    }

    /// Check if the task has finished (done, abandoned or failed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            TaskState::Done | TaskState::Abandoned { .. } | TaskState::Failed { .. }
        )
    }

    /// Check if the task believes it holds a permit
    pub fn holds_permit(&self) -> bool {
        matches!(
            self.state,
            TaskState::HoldingPermit | TaskState::Running | TaskState::Releasing { .. }
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TaskState::Running)
    }

    /// Terminal result, if the task has finished
    pub fn outcome(&self) -> Option<TaskOutcome> {
        match &self.state {
            TaskState::Done => Some(TaskOutcome::Completed),
            TaskState::Abandoned { reason } => Some(match reason {
                AbandonReason::NoSlot => TaskOutcome::NoSlot,
                AbandonReason::StoreUnavailable(_) => TaskOutcome::StoreUnavailable,
                AbandonReason::Interrupted => TaskOutcome::Interrupted,
            }),
            TaskState::Failed {
                cause: ReleaseCause::Interrupted,
            } => Some(TaskOutcome::Interrupted),
            TaskState::Failed { .. } => Some(TaskOutcome::Failed),
            _ => None,
        }
    }

    /// How long the permit was held, once released
    pub fn held_for(&self) -> Option<Duration> {
        match (self.acquired_at, self.finished_at) {
            (Some(acquired), Some(finished)) => Some(finished.saturating_duration_since(acquired)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
