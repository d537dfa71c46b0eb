// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{CapacityAck, LeaseStore, StoreError};
use async_trait::async_trait;
use lh_core::{Permit, SemaphoreId};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any LeaseStore
#[derive(Clone)]
pub struct TracedLeaseStore<S> {
    inner: S,
}

impl<S> TracedLeaseStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for TracedLeaseStore<S> {
    async fn set_capacity(
        &self,
        semaphore: &SemaphoreId,
        capacity: u32,
    ) -> Result<CapacityAck, StoreError> {
        let span = tracing::info_span!("store.set_capacity", %semaphore, capacity);
        async {
            let result = self.inner.set_capacity(semaphore, capacity).await;
            match &result {
                Ok(CapacityAck::Initialized) => tracing::info!("capacity initialized"),
                Ok(CapacityAck::AlreadySet { capacity }) => {
                    tracing::info!(existing = capacity, "capacity already set")
                }
                Err(e) => tracing::error!(error = %e, "set capacity failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn acquire(
        &self,
        semaphore: &SemaphoreId,
        max_wait: Duration,
        lease_ttl: Duration,
    ) -> Result<Option<Permit>, StoreError> {
        let span = tracing::info_span!("store.acquire", %semaphore);
        async {
            tracing::debug!(?max_wait, ?lease_ttl, "waiting for slot");

            let start = Instant::now();
            let result = self.inner.acquire(semaphore, max_wait, lease_ttl).await;

            match &result {
                Ok(Some(permit)) => tracing::info!(
                    permit = %permit.id,
                    elapsed_ms = elapsed_ms(start),
                    "permit acquired"
                ),
                Ok(None) => tracing::info!(elapsed_ms = elapsed_ms(start), "no slot"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed_ms(start),
                    error = %e,
                    "acquire failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn renew(&self, permit: &Permit, lease_ttl: Duration) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.renew", permit = %permit.id);
        async {
            let start = Instant::now();
            let result = self.inner.renew(permit, lease_ttl).await;
            match &result {
                Ok(true) => tracing::debug!(elapsed_ms = elapsed_ms(start), "renewed"),
                // the permit is gone; the holder decides what that means
                Ok(false) => tracing::warn!(elapsed_ms = elapsed_ms(start), "renewal rejected"),
                Err(e) => tracing::error!(error = %e, "renewal failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn release(&self, permit: &Permit) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.release", permit = %permit.id);
        async {
            let result = self.inner.release(permit).await;
            // release failing is survivable: the lease expires on its own
            match &result {
                Ok(()) => tracing::info!("released"),
                Err(e) => tracing::warn!(error = %e, "release failed (lease will expire)"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn valid_permits(&self, semaphore: &SemaphoreId) -> Result<u32, StoreError> {
        let result = self.inner.valid_permits(semaphore).await;
        tracing::trace!(%semaphore, valid = ?result.as_ref().ok(), "checked");
        result
    }

    async fn close(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.close");
        async {
            let result = self.inner.close().await;
            match &result {
                Ok(()) => tracing::info!("closed"),
                Err(e) => tracing::error!(error = %e, "close failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
