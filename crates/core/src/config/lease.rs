// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease timing: TTL, heartbeat cadence, acquisition wait

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for one permit's lifecycle.
///
/// `ttl` must leave room for at least one failed renewal: with
/// `ttl >= 2 * heartbeat_interval`, a tick can fail and the next one still
/// lands before the store reclaims the permit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaseTiming {
    /// Lease length granted on acquire and on every renewal
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Period between renewals of a held permit
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
    /// How long a task waits for a free slot before giving up
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
    /// Cap on how long a task may keep renewing. `None` renews for as long
    /// as the work runs.
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_lifetime: Option<Duration>,
}

impl Default for LeaseTiming {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(166),
            heartbeat_interval: Duration::from_secs(20),
            max_wait: Duration::from_secs(60),
            max_lifetime: None,
        }
    }
}

impl LeaseTiming {
    pub fn new(ttl: Duration, heartbeat_interval: Duration) -> Result<Self, ConfigError> {
        let timing = Self {
            ttl,
            heartbeat_interval,
            ..Self::default()
        };
        timing.validate()?;
        Ok(timing)
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = Some(lifetime);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_ttl = self.heartbeat_interval.checked_mul(2);
        if self.heartbeat_interval.is_zero() || !min_ttl.is_some_and(|min| self.ttl >= min) {
            return Err(ConfigError::LeaseTooShort {
                ttl: self.ttl,
                heartbeat_interval: self.heartbeat_interval,
            });
        }
        if self.max_lifetime.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroLifetime);
        }
        Ok(())
    }

    /// How many consecutive renewals can fail before the lease lapses
    pub fn renewal_slack(&self) -> u32 {
        let ticks = self.ttl.as_nanos() / self.heartbeat_interval.as_nanos().max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX).saturating_sub(1)
    }
}
