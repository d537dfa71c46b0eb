// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permit holder: acquire, keep alive, release
//!
//! Once a permit is handed to [`PermitHolder::hold`] it is released exactly
//! through [`HeldPermit::release`], or in the background if the guard is
//! dropped first. The heartbeat is always cancelled before the release call.

use crate::error::SchedulerError;
use crate::heartbeat::{HeartbeatHandle, HeartbeatScheduler, RenewalLog};
use lh_adapters::{LeaseStore, StoreError};
use lh_core::{LeaseTiming, Permit, SemaphoreId};

/// Result of waiting for a permit
#[derive(Debug)]
pub enum Acquisition {
    Acquired(Permit),
    /// `max_wait` elapsed with every slot taken
    NoSlot,
    /// The store could not be reached
    Unavailable(StoreError),
}

/// Acquires permits for one semaphore and keeps them alive
#[derive(Clone)]
pub struct PermitHolder<S> {
    store: S,
    heartbeats: HeartbeatScheduler,
    semaphore: SemaphoreId,
    timing: LeaseTiming,
}

impl<S: LeaseStore> PermitHolder<S> {
    pub fn new(
        store: S,
        heartbeats: HeartbeatScheduler,
        semaphore: SemaphoreId,
        timing: LeaseTiming,
    ) -> Self {
        Self {
            store,
            heartbeats,
            semaphore,
            timing,
        }
    }

    pub fn semaphore(&self) -> &SemaphoreId {
        &self.semaphore
    }

    pub fn timing(&self) -> &LeaseTiming {
        &self.timing
    }

    /// Wait up to `max_wait` for a permit with a full `ttl` lease
    pub async fn acquire(&self) -> Acquisition {
        let result = self
            .store
            .acquire(&self.semaphore, self.timing.max_wait, self.timing.ttl)
            .await;
        match result {
            Ok(Some(permit)) => Acquisition::Acquired(permit),
            Ok(None) => Acquisition::NoSlot,
            Err(e) => Acquisition::Unavailable(e),
        }
    }

    /// Take responsibility for releasing `permit`
    pub fn hold(&self, permit: Permit) -> HeldPermit<S> {
        HeldPermit {
            permit,
            store: self.store.clone(),
            heartbeat: None,
            released: false,
        }
    }

    /// Start renewing `held` every heartbeat interval
    pub fn keep_alive(&self, held: &mut HeldPermit<S>) -> Result<(), SchedulerError> {
        let handle = self
            .heartbeats
            .schedule(held.permit.clone(), self.timing.heartbeat_interval)?;
        held.heartbeat = Some(handle);
        Ok(())
    }
}

/// A permit this process is responsible for releasing
pub struct HeldPermit<S: LeaseStore> {
    permit: Permit,
    store: S,
    heartbeat: Option<HeartbeatHandle>,
    released: bool,
}

impl<S: LeaseStore> HeldPermit<S> {
    pub fn permit(&self) -> &Permit {
        &self.permit
    }

    pub fn heartbeat(&self) -> Option<&HeartbeatHandle> {
        self.heartbeat.as_ref()
    }

    /// Cancel the heartbeat, then release the permit.
    ///
    /// Never fails: a release the store refuses is logged and left to
    /// lease expiry. Returns the permit's renewal history.
    pub async fn release(mut self) -> RenewalLog {
        let renewals = self.stop_heartbeat();
        match self.store.release(&self.permit).await {
            Ok(()) => tracing::debug!(permit = %self.permit, "permit released"),
            Err(e) => tracing::warn!(
                permit = %self.permit,
                error = %e,
                "release failed, permit will expire after its lease"
            ),
        }
        self.released = true;
        renewals
    }

    fn stop_heartbeat(&mut self) -> RenewalLog {
        match &self.heartbeat {
            Some(handle) => {
                handle.cancel();
                handle.log()
            }
            None => RenewalLog::default(),
        }
    }
}

impl<S: LeaseStore> Drop for HeldPermit<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.stop_heartbeat();
        tracing::warn!(permit = %self.permit, "permit dropped while held, releasing in background");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = self.store.clone();
        let permit = self.permit.clone();
        runtime.spawn(async move {
            if let Err(e) = store.release(&permit).await {
                tracing::warn!(%permit, error = %e, "background release failed");
            }
        });
    }
}

#[cfg(test)]
#[path = "holder_tests.rs"]
mod tests;
