// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for lease expiry and task timestamps
//!
//! Lease expirations are compared against `Clock::now()`, never against
//! wall-clock time, so the store and the holders agree on one monotonic view.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Instant `after` from now, clamped to the far future
    fn deadline(&self, after: Duration) -> Instant {
        saturating_add(self.now(), after)
    }
}

/// Longest offset ever added to an instant, about 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `at + after` with `after` clamped to about 30 years, so configured
/// durations can never overflow `Instant`
pub fn saturating_add(at: Instant, after: Duration) -> Instant {
    at.checked_add(after.min(FAR_FUTURE)).unwrap_or(at)
}

/// Monotonic clock backed by tokio's timer.
///
/// Reads through `tokio::time::Instant` so that a runtime with paused time
/// sees the same instants as the timers that sleep on it. Outside a runtime
/// this is plain `Instant::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
