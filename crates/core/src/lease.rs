// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease table: the slot accounting behind one semaphore identity
//!
//! Pure state machine. A lease counts against capacity until it is released
//! or its expiry passes; expired leases are reclaimed on every transition.

use crate::clock::{saturating_add, Clock};
use crate::event::Event;
use crate::permit::{PermitId, SemaphoreId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One granted permit as the store sees it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    pub permit: PermitId,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

/// Permits outstanding against a capacity-limited semaphore
#[derive(Clone, Debug)]
pub struct LeaseTable {
    pub semaphore: SemaphoreId,
    pub capacity: u32,
    pub leases: HashMap<PermitId, Lease>,
}

/// Inputs that drive lease table transitions
#[derive(Clone, Debug)]
pub enum LeaseInput {
    /// Grant `permit` for `ttl` if a slot is free
    Grant { permit: PermitId, ttl: Duration },
    /// Push an existing lease's expiry to now + `ttl`
    Renew { permit: PermitId, ttl: Duration },
    /// Drop a lease; unknown permits are ignored
    Release { permit: PermitId },
    /// Reclaim expired leases (called before waiting)
    Tick,
}

impl LeaseTable {
    pub fn new(semaphore: SemaphoreId, capacity: u32) -> Self {
        Self {
            semaphore,
            capacity,
            leases: HashMap::new(),
        }
    }

    /// Leases currently counted against capacity
    pub fn used(&self) -> u32 {
        u32::try_from(self.leases.len()).unwrap_or(u32::MAX)
    }

    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.used())
    }

    pub fn holds(&self, permit: &PermitId) -> bool {
        self.leases.contains_key(permit)
    }

    /// Earliest expiry among outstanding leases
    pub fn next_expiry(&self) -> Option<Instant> {
        self.leases.values().map(|l| l.expires_at).min()
    }

    /// Leases whose expiry has passed
    pub fn expired(&self, clock: &impl Clock) -> Vec<PermitId> {
        let now = clock.now();
        self.leases
            .values()
            .filter(|l| l.expires_at <= now)
            .map(|l| l.permit.clone())
            .collect()
    }

    /// Pure state transition function
    pub fn transition(&self, input: LeaseInput, clock: &impl Clock) -> (LeaseTable, Vec<Event>) {
        let mut table = self.clone();
        let mut events = Vec::new();
        let now = clock.now();

        for permit in self.expired(clock) {
            if table.leases.remove(&permit).is_some() {
                events.push(Event::PermitExpired {
                    semaphore: self.semaphore.clone(),
                    permit,
                });
            }
        }

        match input {
            LeaseInput::Grant { permit, ttl } => {
                if table.available() > 0 {
                    table.leases.insert(
                        permit.clone(),
                        Lease {
                            permit: permit.clone(),
                            issued_at: now,
                            expires_at: saturating_add(now, ttl),
                        },
                    );
                    events.push(Event::PermitGranted {
                        semaphore: self.semaphore.clone(),
                        permit,
                        available: table.available(),
                    });
                } else {
                    events.push(Event::PermitDenied {
                        semaphore: self.semaphore.clone(),
                        capacity: table.capacity,
                    });
                }
            }

            LeaseInput::Renew { permit, ttl } => match table.leases.get_mut(&permit) {
                Some(lease) => {
                    lease.expires_at = saturating_add(now, ttl);
                    events.push(Event::PermitRenewed {
                        semaphore: self.semaphore.clone(),
                        permit,
                    });
                }
                None => events.push(Event::PermitRenewRejected {
                    semaphore: self.semaphore.clone(),
                    permit,
                }),
            },

            LeaseInput::Release { permit } => {
                if table.leases.remove(&permit).is_some() {
                    events.push(Event::PermitReleased {
                        semaphore: self.semaphore.clone(),
                        permit,
                        available: table.available(),
                    });
                }
            }

            LeaseInput::Tick => {}
        }

        (table, events)
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
