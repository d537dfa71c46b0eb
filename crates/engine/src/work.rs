// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of work a task runs while holding a permit

use crate::error::WorkError;
use async_trait::async_trait;
use lh_core::{DispatchSettings, TaskId};
use rand::Rng;
use std::time::Duration;

/// Work run inside the window bounded by a held permit
#[async_trait]
pub trait Work: Send + Sync + 'static {
    async fn run(&self, task: &TaskId) -> Result<(), WorkError>;
}

/// Stand-in for a remote script: sleeps a uniformly random duration
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWork {
    min: Duration,
    max: Duration,
}

impl SimulatedWork {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self::new(settings.work_min, settings.work_max)
    }

    /// Draw one work duration in `[min, max]`, millisecond resolution
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait]
impl Work for SimulatedWork {
    async fn run(&self, task: &TaskId) -> Result<(), WorkError> {
        let duration = self.sample();
        tracing::info!(task = %task, ?duration, "work started");
        tokio::time::sleep(duration).await;
        tracing::info!(task = %task, "work finished");
        Ok(())
    }
}

#[cfg(test)]
#[path = "work_tests.rs"]
mod tests;
