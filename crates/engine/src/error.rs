// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use thiserror::Error;

/// Errors from the heartbeat scheduler and the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("heartbeat scheduler is shut down")]
    HeartbeatsStopped,
    #[error("heartbeat interval must be greater than zero")]
    ZeroInterval,
    #[error("worker pool no longer accepts tasks")]
    PoolClosed,
}

/// A unit of work failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),
}
