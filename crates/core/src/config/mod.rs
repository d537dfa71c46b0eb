// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration
//!
//! Loaded from TOML; every field has a default, so an empty file is a
//! valid configuration. Durations use humantime syntax (`"20s"`, `"150ms"`).

mod lease;

pub use lease::LeaseTiming;

use crate::permit::SemaphoreId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(
        "lease ttl {ttl:?} must be at least twice the heartbeat interval {heartbeat_interval:?}"
    )]
    LeaseTooShort {
        ttl: Duration,
        heartbeat_interval: Duration,
    },

    #[error("lease max_lifetime must be greater than zero")]
    ZeroLifetime,

    #[error("semaphore id must not be empty")]
    EmptySemaphoreId,

    #[error("semaphore capacity must be at least 1, got {0}")]
    InvalidCapacity(u32),

    #[error("{0} must be at least 1")]
    EmptyPool(&'static str),

    #[error("work_min {min:?} exceeds work_max {max:?}")]
    InvalidWorkRange { min: Duration, max: Duration },
}

/// The resource being guarded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemaphoreSettings {
    pub id: SemaphoreId,
    /// Maximum simultaneously valid permits
    pub capacity: u32,
}

impl Default for SemaphoreSettings {
    fn default() -> Self {
        Self {
            id: SemaphoreId::new("host:192.168.1.1:script-100"),
            capacity: 2,
        }
    }
}

/// Thread-footprint knobs, sized independently of the task count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Tasks running at once; extra tasks queue
    pub workers: usize,
    /// Executors shared by every heartbeat
    pub heartbeat_workers: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            heartbeat_workers: 4,
        }
    }
}

/// Batch shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchSettings {
    pub tasks: usize,
    /// Delay between submissions, emulating staggered arrival
    #[serde(with = "humantime_serde")]
    pub spacing: Duration,
    #[serde(with = "humantime_serde")]
    pub work_min: Duration,
    #[serde(with = "humantime_serde")]
    pub work_max: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            tasks: 5,
            spacing: Duration::from_secs(1),
            work_min: Duration::from_secs(10),
            work_max: Duration::from_secs(110),
        }
    }
}

/// Grace periods for the three shutdown phases
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownSettings {
    #[serde(with = "humantime_serde")]
    pub task_grace: Duration,
    #[serde(with = "humantime_serde")]
    pub heartbeat_grace: Duration,
    #[serde(with = "humantime_serde")]
    pub store_grace: Duration,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            task_grace: Duration::from_secs(3),
            heartbeat_grace: Duration::from_secs(3),
            store_grace: Duration::from_secs(3),
        }
    }
}

/// Complete run configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub semaphore: SemaphoreSettings,
    pub lease: LeaseTiming,
    pub pool: PoolSettings,
    pub dispatch: DispatchSettings,
    pub shutdown: ShutdownSettings,
}

impl Settings {
    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.semaphore.id.as_str().is_empty() {
            return Err(ConfigError::EmptySemaphoreId);
        }
        if self.semaphore.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(0));
        }
        self.lease.validate()?;
        if self.pool.workers == 0 {
            return Err(ConfigError::EmptyPool("pool.workers"));
        }
        if self.pool.heartbeat_workers == 0 {
            return Err(ConfigError::EmptyPool("pool.heartbeat_workers"));
        }
        if self.dispatch.work_min > self.dispatch.work_max {
            return Err(ConfigError::InvalidWorkRange {
                min: self.dispatch.work_min,
                max: self.dispatch.work_max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
