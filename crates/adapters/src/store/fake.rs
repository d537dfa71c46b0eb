// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lease store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CapacityAck, LeaseStore, MemoryLeaseStore, StoreError};
use async_trait::async_trait;
use lh_core::{Permit, PermitId, SemaphoreId, SequentialIdGen, SystemClock};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    SetCapacity {
        semaphore: SemaphoreId,
        capacity: u32,
    },
    Acquire {
        semaphore: SemaphoreId,
        max_wait: Duration,
    },
    Renew {
        permit: PermitId,
    },
    Release {
        permit: PermitId,
    },
    ValidPermits {
        semaphore: SemaphoreId,
    },
    Close,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<StoreCall>,
    acquire_error: Option<StoreError>,
    renew_failures: usize,
    release_failures: usize,
    close_error: Option<StoreError>,
    renew_delay: Option<Duration>,
    release_delay: Option<Duration>,
}

/// Fake lease store for testing
///
/// Real slot accounting comes from an in-memory store with sequential
/// permit ids (`permit-1`, `permit-2`, ...). Faults are injected per call.
#[derive(Clone)]
pub struct FakeLeaseStore {
    inner: MemoryLeaseStore<SystemClock, SequentialIdGen>,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLeaseStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryLeaseStore::with_parts(SystemClock, SequentialIdGen::default()),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn record(&self, call: StoreCall) {
        self.with_state(|s| s.calls.push(call));
    }

    /// Make the next acquire fail with `error`
    pub fn fail_next_acquire(&self, error: StoreError) {
        self.with_state(|s| s.acquire_error = Some(error));
    }

    /// Make the next `count` renewals fail with a lost connection
    pub fn fail_renewals(&self, count: usize) {
        self.with_state(|s| s.renew_failures = count);
    }

    /// Make the next `count` releases fail with a lost connection
    pub fn fail_releases(&self, count: usize) {
        self.with_state(|s| s.release_failures = count);
    }

    /// Make close fail with `error`
    pub fn fail_close(&self, error: StoreError) {
        self.with_state(|s| s.close_error = Some(error));
    }

    /// Delay every renewal by `delay` before it reaches the store
    pub fn delay_renewals(&self, delay: Duration) {
        self.with_state(|s| s.renew_delay = Some(delay));
    }

    /// Delay every release by `delay` before it reaches the store
    pub fn delay_releases(&self, delay: Duration) {
        self.with_state(|s| s.release_delay = Some(delay));
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Number of renewal attempts for `permit`
    pub fn renewals_of(&self, permit: &PermitId) -> usize {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, StoreCall::Renew { permit: p } if p == permit))
                .count()
        })
    }

    /// Permit ids passed to release, in call order
    pub fn releases(&self) -> Vec<PermitId> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter_map(|c| match c {
                    StoreCall::Release { permit } => Some(permit.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    /// The backing in-memory store, bypassing recording and faults
    pub fn backing(&self) -> &MemoryLeaseStore<SystemClock, SequentialIdGen> {
        &self.inner
    }
}

#[async_trait]
impl LeaseStore for FakeLeaseStore {
    async fn set_capacity(
        &self,
        semaphore: &SemaphoreId,
        capacity: u32,
    ) -> Result<CapacityAck, StoreError> {
        self.record(StoreCall::SetCapacity {
            semaphore: semaphore.clone(),
            capacity,
        });
        self.inner.set_capacity(semaphore, capacity).await
    }

    async fn acquire(
        &self,
        semaphore: &SemaphoreId,
        max_wait: Duration,
        lease_ttl: Duration,
    ) -> Result<Option<Permit>, StoreError> {
        self.record(StoreCall::Acquire {
            semaphore: semaphore.clone(),
            max_wait,
        });
        if let Some(error) = self.with_state(|s| s.acquire_error.take()) {
            return Err(error);
        }
        self.inner.acquire(semaphore, max_wait, lease_ttl).await
    }

    async fn renew(&self, permit: &Permit, lease_ttl: Duration) -> Result<bool, StoreError> {
        self.record(StoreCall::Renew {
            permit: permit.id.clone(),
        });
        let (delay, fail) = self.with_state(|s| {
            let fail = s.renew_failures > 0;
            if fail {
                s.renew_failures -= 1;
            }
            (s.renew_delay, fail)
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::ConnectionLost("injected renewal failure".into()));
        }
        self.inner.renew(permit, lease_ttl).await
    }

    async fn release(&self, permit: &Permit) -> Result<(), StoreError> {
        self.record(StoreCall::Release {
            permit: permit.id.clone(),
        });
        let (delay, fail) = self.with_state(|s| {
            let fail = s.release_failures > 0;
            if fail {
                s.release_failures -= 1;
            }
            (s.release_delay, fail)
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::ConnectionLost("injected release failure".into()));
        }
        self.inner.release(permit).await
    }

    async fn valid_permits(&self, semaphore: &SemaphoreId) -> Result<u32, StoreError> {
        self.record(StoreCall::ValidPermits {
            semaphore: semaphore.clone(),
        });
        self.inner.valid_permits(semaphore).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.record(StoreCall::Close);
        if let Some(error) = self.with_state(|s| s.close_error.take()) {
            return Err(error);
        }
        self.inner.close().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
