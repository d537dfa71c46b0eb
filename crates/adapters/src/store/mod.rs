// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease store: the shared source of truth for permit slots
//!
//! The store owns slot accounting and expiry. Holders never lock around
//! store calls; a `LeaseStore` must be safe to call from many tasks at once.

mod memory;

pub use memory::MemoryLeaseStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLeaseStore, StoreCall};

use async_trait::async_trait;
use lh_core::{Permit, SemaphoreId};
use std::time::Duration;
use thiserror::Error;

/// Communication faults. "No slot" is not an error: see [`LeaseStore::acquire`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
    #[error("store connection lost: {0}")]
    ConnectionLost(String),
    #[error("store is closed")]
    Closed,
    #[error("invalid capacity {0}")]
    InvalidCapacity(u32),
}

/// Result of an initial capacity assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityAck {
    /// This call set the capacity
    Initialized,
    /// Capacity was already set (possibly to a different value, which is kept)
    AlreadySet { capacity: u32 },
}

/// Client for the remote lease store
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// Set the capacity of `semaphore` if it has none yet.
    ///
    /// Safe under concurrent first callers: exactly one sees `Initialized`.
    async fn set_capacity(
        &self,
        semaphore: &SemaphoreId,
        capacity: u32,
    ) -> Result<CapacityAck, StoreError>;

    /// Wait up to `max_wait` for a slot.
    ///
    /// `Ok(None)` means no slot freed up in time; `Err` means the store could
    /// not be reached. A zero `max_wait` never blocks.
    async fn acquire(
        &self,
        semaphore: &SemaphoreId,
        max_wait: Duration,
        lease_ttl: Duration,
    ) -> Result<Option<Permit>, StoreError>;

    /// Extend `permit` to now + `lease_ttl`. `Ok(false)` if it is no longer valid.
    async fn renew(&self, permit: &Permit, lease_ttl: Duration) -> Result<bool, StoreError>;

    /// Release `permit`. Releasing an unknown, expired or released permit is a no-op.
    async fn release(&self, permit: &Permit) -> Result<(), StoreError>;

    /// Number of currently valid permits for `semaphore`
    async fn valid_permits(&self, semaphore: &SemaphoreId) -> Result<u32, StoreError>;

    /// Close the connection; later calls fail with [`StoreError::Closed`]
    async fn close(&self) -> Result<(), StoreError>;
}
