// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store
//!
//! Keeps one [`LeaseTable`] per semaphore behind a mutex. Blocked acquirers
//! sleep until a release, a capacity change, close, or the earliest lease
//! expiry, whichever comes first.

use super::{CapacityAck, LeaseStore, StoreError};
use async_trait::async_trait;
use lh_core::{
    Clock, Event, IdGen, LeaseInput, LeaseTable, Permit, SemaphoreId, SystemClock, UuidIdGen,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Lease store living inside this process.
///
/// Sleeps go through tokio's timer, so blocking acquires expect a clock that
/// advances with tokio time (the default [`SystemClock`]).
pub struct MemoryLeaseStore<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    inner: Arc<Inner<C, G>>,
}

struct Inner<C, G> {
    clock: C,
    ids: G,
    tables: Mutex<HashMap<SemaphoreId, LeaseTable>>,
    closed: AtomicBool,
    /// Signalled whenever a slot may have become free
    changed: Notify,
}

enum Attempt {
    Granted(Permit),
    Full { next_expiry: Option<Instant> },
}

impl<C: Clock, G: IdGen> Clone for MemoryLeaseStore<C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::with_parts(SystemClock, UuidIdGen)
    }
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, G: IdGen> MemoryLeaseStore<C, G> {
    pub fn with_parts(clock: C, ids: G) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                ids,
                tables: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
                changed: Notify::new(),
            }),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Apply `input` to the table for `semaphore`, logging and returning its events
    fn apply(&self, semaphore: &SemaphoreId, input: LeaseInput) -> Option<(LeaseTable, Vec<Event>)> {
        let mut tables = self.inner.tables.lock().unwrap_or_else(|e| e.into_inner());
        let table = tables.get_mut(semaphore)?;
        let (next, events) = table.transition(input, &self.inner.clock);
        *table = next.clone();
        drop(tables);

        for event in &events {
            event.log();
        }
        if events.iter().any(|e| {
            matches!(
                e,
                Event::PermitReleased { .. } | Event::PermitExpired { .. }
            )
        }) {
            self.inner.changed.notify_waiters();
        }
        Some((next, events))
    }

    fn try_grant(&self, semaphore: &SemaphoreId, lease_ttl: Duration) -> Attempt {
        let permit_id = self.inner.ids.next_permit();
        let input = LeaseInput::Grant {
            permit: permit_id.clone(),
            ttl: lease_ttl,
        };
        match self.apply(semaphore, input) {
            Some((table, _)) => match table.leases.get(&permit_id) {
                Some(lease) => Attempt::Granted(Permit::new(
                    permit_id,
                    semaphore.clone(),
                    lease.issued_at,
                    lease_ttl,
                )),
                None => Attempt::Full {
                    next_expiry: table.next_expiry(),
                },
            },
            // no capacity configured yet: behaves as zero slots
            None => Attempt::Full { next_expiry: None },
        }
    }
}

#[async_trait]
impl<C: Clock, G: IdGen> LeaseStore for MemoryLeaseStore<C, G> {
    async fn set_capacity(
        &self,
        semaphore: &SemaphoreId,
        capacity: u32,
    ) -> Result<CapacityAck, StoreError> {
        self.ensure_open()?;
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity(capacity));
        }

        let mut tables = self.inner.tables.lock().unwrap_or_else(|e| e.into_inner());
        let ack = match tables.entry(semaphore.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(LeaseTable::new(semaphore.clone(), capacity));
                CapacityAck::Initialized
            }
            Entry::Occupied(existing) => {
                let current = existing.get().capacity;
                if current != capacity {
                    tracing::warn!(
                        %semaphore,
                        current,
                        requested = capacity,
                        "capacity already set, keeping existing value"
                    );
                }
                CapacityAck::AlreadySet { capacity: current }
            }
        };
        drop(tables);

        if ack == CapacityAck::Initialized {
            self.inner.changed.notify_waiters();
        }
        Ok(ack)
    }

    async fn acquire(
        &self,
        semaphore: &SemaphoreId,
        max_wait: Duration,
        lease_ttl: Duration,
    ) -> Result<Option<Permit>, StoreError> {
        let deadline = self.inner.clock.deadline(max_wait);

        loop {
            // Register interest before looking, so a release between the
            // attempt and the wait is not missed.
            let changed = self.inner.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            self.ensure_open()?;
            let next_expiry = match self.try_grant(semaphore, lease_ttl) {
                Attempt::Granted(permit) => return Ok(Some(permit)),
                Attempt::Full { next_expiry } => next_expiry,
            };

            if self.inner.clock.now() >= deadline {
                return Ok(None);
            }
            let wake_at = next_expiry.map_or(deadline, |expiry| expiry.min(deadline));

            tokio::select! {
                _ = &mut changed => {}
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake_at)) => {}
            }
        }
    }

    async fn renew(&self, permit: &Permit, lease_ttl: Duration) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let input = LeaseInput::Renew {
            permit: permit.id.clone(),
            ttl: lease_ttl,
        };
        Ok(self
            .apply(&permit.semaphore, input)
            .is_some_and(|(table, events)| {
                table.holds(&permit.id)
                    && events
                        .iter()
                        .any(|e| matches!(e, Event::PermitRenewed { .. }))
            }))
    }

    async fn release(&self, permit: &Permit) -> Result<(), StoreError> {
        self.ensure_open()?;
        let input = LeaseInput::Release {
            permit: permit.id.clone(),
        };
        self.apply(&permit.semaphore, input);
        Ok(())
    }

    async fn valid_permits(&self, semaphore: &SemaphoreId) -> Result<u32, StoreError> {
        self.ensure_open()?;
        Ok(self
            .apply(semaphore, LeaseInput::Tick)
            .map_or(0, |(table, _)| table.used()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.changed.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
