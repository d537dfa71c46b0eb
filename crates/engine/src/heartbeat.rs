// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat scheduler
//!
//! Each held permit registers one recurring renewal. Scheduling is separate
//! from execution: a driver task owns the timer queue and hands due renewals
//! over a bounded channel to a small, fixed set of executor tasks, so the
//! number of renewals in flight never depends on how many tasks hold permits.
//!
//! A renewal never fails the scheduler. Each tick is an independent attempt;
//! a failed one is recorded and left for the next tick.

use crate::error::SchedulerError;
use crate::timers::{TimerId, TimerQueue};
use lh_adapters::LeaseStore;
use lh_core::{Clock, Permit, SystemClock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinSet;

/// Renewal outcomes for one permit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenewalLog {
    pub attempts: u64,
    pub renewed: u64,
    /// The store no longer knew the permit
    pub rejected: u64,
    /// The store could not be reached
    pub faulted: u64,
}

/// Scheduler-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeartbeatStats {
    pub scheduled: u64,
    pub cancelled: u64,
    pub attempts: u64,
    pub renewed: u64,
    pub rejected: u64,
    pub faulted: u64,
    /// In-flight renewals cut short by a cancel
    pub interrupted: u64,
    /// Ticks dropped because the previous renewal was still running
    pub skipped: u64,
    /// Registrations not yet cancelled
    pub active: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    InFlight,
    Cancelled,
}

struct Registration {
    id: TimerId,
    permit: Permit,
    status: Mutex<Status>,
    interrupt: Notify,
    log: Mutex<RenewalLog>,
}

impl Registration {
    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the registration for one renewal. False if cancelled or busy.
    fn begin(&self) -> bool {
        let mut status = self.status();
        if *status == Status::Idle {
            *status = Status::InFlight;
            true
        } else {
            false
        }
    }

    fn finish(&self) {
        let mut status = self.status();
        if *status == Status::InFlight {
            *status = Status::Idle;
        }
    }

    fn record(&self, f: impl FnOnce(&mut RenewalLog)) {
        f(&mut self.log.lock().unwrap_or_else(|e| e.into_inner()));
    }
}

#[derive(Default)]
struct Counters {
    scheduled: AtomicU64,
    cancelled: AtomicU64,
    attempts: AtomicU64,
    renewed: AtomicU64,
    rejected: AtomicU64,
    faulted: AtomicU64,
    interrupted: AtomicU64,
    skipped: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// State shared by the scheduler, its handles, the driver and the executors
#[derive(Default)]
struct Registry {
    queue: Mutex<TimerQueue>,
    registrations: Mutex<HashMap<TimerId, Arc<Registration>>>,
    next_id: AtomicU64,
    /// Wakes the driver when the queue changes
    wake: Notify,
    stopping: AtomicBool,
    counters: Counters,
}

impl Registry {
    fn queue(&self) -> MutexGuard<'_, TimerQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn registrations(&self) -> MutexGuard<'_, HashMap<TimerId, Arc<Registration>>> {
        self.registrations.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}

/// Cancellation token for one permit's renewals
///
/// Cloneable; `cancel` is idempotent and may be called from anywhere. Once
/// `cancel` returns no new renewal starts for this permit. A renewal already
/// in flight is interrupted best-effort.
#[derive(Clone)]
pub struct HeartbeatHandle {
    registration: Arc<Registration>,
    registry: Arc<Registry>,
}

impl HeartbeatHandle {
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.registration.status(), Status::Cancelled);
        match previous {
            Status::Cancelled => return,
            Status::InFlight => self.registration.interrupt.notify_one(),
            Status::Idle => {}
        }

        let id = self.registration.id;
        if !self.registry.is_stopping() {
            self.registry.queue().cancel(id);
        }
        self.registry.registrations().remove(&id);
        bump(&self.registry.counters.cancelled);
        tracing::debug!(permit = %self.registration.permit.id, "heartbeat cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        *self.registration.status() == Status::Cancelled
    }

    pub fn permit(&self) -> &Permit {
        &self.registration.permit
    }

    pub fn log(&self) -> RenewalLog {
        *self.registration.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for HeartbeatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatHandle")
            .field("permit", &self.registration.permit.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Shared pool of recurring renewal timers
#[derive(Clone)]
pub struct HeartbeatScheduler {
    registry: Arc<Registry>,
    workers: Arc<Mutex<Option<JoinSet<()>>>>,
}

impl HeartbeatScheduler {
    /// Spawn the driver and `executors` renewal executors on the current runtime
    pub fn start<S: LeaseStore>(store: S, executors: usize) -> Self {
        let executors = executors.max(1);
        let registry = Arc::new(Registry::default());
        let (due_tx, due_rx) = mpsc::channel(executors);
        let due_rx = Arc::new(tokio::sync::Mutex::new(due_rx));

        let mut workers = JoinSet::new();
        workers.spawn(drive(Arc::clone(&registry), due_tx));
        for _ in 0..executors {
            workers.spawn(execute(
                store.clone(),
                Arc::clone(&registry),
                Arc::clone(&due_rx),
            ));
        }
        tracing::debug!(executors, "heartbeat scheduler started");

        Self {
            registry,
            workers: Arc::new(Mutex::new(Some(workers))),
        }
    }

    /// Renew `permit` every `interval`, first one `interval` from now
    pub fn schedule(
        &self,
        permit: Permit,
        interval: Duration,
    ) -> Result<HeartbeatHandle, SchedulerError> {
        if self.registry.is_stopping() {
            return Err(SchedulerError::HeartbeatsStopped);
        }
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }

        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(permit = %permit.id, ?interval, "heartbeat scheduled");
        let registration = Arc::new(Registration {
            id,
            permit,
            status: Mutex::new(Status::Idle),
            interrupt: Notify::new(),
            log: Mutex::new(RenewalLog::default()),
        });

        self.registry
            .registrations()
            .insert(id, Arc::clone(&registration));
        self.registry
            .queue()
            .schedule_repeating(id, SystemClock.deadline(interval), interval);
        bump(&self.registry.counters.scheduled);
        self.registry.wake.notify_one();

        Ok(HeartbeatHandle {
            registration,
            registry: Arc::clone(&self.registry),
        })
    }

    pub fn stats(&self) -> HeartbeatStats {
        let c = &self.registry.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        HeartbeatStats {
            scheduled: load(&c.scheduled),
            cancelled: load(&c.cancelled),
            attempts: load(&c.attempts),
            renewed: load(&c.renewed),
            rejected: load(&c.rejected),
            faulted: load(&c.faulted),
            interrupted: load(&c.interrupted),
            skipped: load(&c.skipped),
            active: self.registry.registrations().len() as u64,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.registry.is_stopping()
    }

    /// Stop scheduling and wait up to `grace` for in-flight renewals.
    ///
    /// Pending timers are dropped; no renewal starts after this is called.
    /// Returns the number of renewals still in flight when the grace period
    /// ran out (they are aborted).
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.registry.stopping.store(true, Ordering::SeqCst);
        {
            let mut queue = self.registry.queue();
            tracing::debug!(dropped = queue.len(), "dropping pending heartbeat timers");
            queue.clear();
        }
        self.registry.wake.notify_one();

        let workers = self
            .workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(mut workers) = workers else {
            return 0;
        };

        let drained = tokio::time::timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await;
        if drained.is_ok() {
            tracing::info!("heartbeat scheduler stopped");
            return 0;
        }

        let in_flight = self
            .registry
            .registrations()
            .values()
            .filter(|r| *r.status() == Status::InFlight)
            .count();
        tracing::warn!(in_flight, ?grace, "heartbeat grace period elapsed, aborting renewals");
        workers.shutdown().await;
        in_flight
    }
}

/// Sleep until the next timer is due, then hand due renewals to executors
async fn drive(registry: Arc<Registry>, due: mpsc::Sender<Arc<Registration>>) {
    while !registry.is_stopping() {
        let next = registry.queue().next_fire_time();
        let sleep = async {
            match next {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = registry.wake.notified() => continue,
            _ = sleep => {}
        }

        let ready = registry.queue().poll(SystemClock.now());
        for id in ready {
            let registration = registry.registrations().get(&id).cloned();
            let Some(registration) = registration else {
                continue;
            };
            if due.send(registration).await.is_err() {
                return;
            }
        }
    }
}

/// Run due renewals until the driver goes away
async fn execute<S: LeaseStore>(
    store: S,
    registry: Arc<Registry>,
    due: Arc<tokio::sync::Mutex<mpsc::Receiver<Arc<Registration>>>>,
) {
    loop {
        let next = due.lock().await.recv().await;
        let Some(registration) = next else {
            break;
        };
        // drain without renewing once stopping
        if registry.is_stopping() {
            continue;
        }
        renew_once(&store, &registry, &registration).await;
    }
}

async fn renew_once<S: LeaseStore>(store: &S, registry: &Registry, registration: &Registration) {
    let counters = &registry.counters;
    let permit = &registration.permit;

    if !registration.begin() {
        if *registration.status() == Status::InFlight {
            bump(&counters.skipped);
            tracing::debug!(permit = %permit.id, "previous renewal still in flight, skipping tick");
        }
        return;
    }

    bump(&counters.attempts);
    registration.record(|log| log.attempts += 1);

    let result = tokio::select! {
        biased;
        _ = registration.interrupt.notified() => None,
        result = store.renew(permit, permit.lease_ttl) => Some(result),
    };
    registration.finish();

    match result {
        None => {
            bump(&counters.interrupted);
            tracing::debug!(permit = %permit.id, "in-flight renewal interrupted");
        }
        Some(Ok(true)) => {
            bump(&counters.renewed);
            registration.record(|log| log.renewed += 1);
            tracing::info!(permit = %permit.id, "heartbeat renewed");
        }
        Some(Ok(false)) => {
            bump(&counters.rejected);
            registration.record(|log| log.rejected += 1);
            tracing::warn!(permit = %permit.id, "heartbeat rejected, permit no longer valid");
        }
        Some(Err(e)) => {
            bump(&counters.faulted);
            registration.record(|log| log.faulted += 1);
            tracing::error!(permit = %permit.id, error = %e, "heartbeat renewal failed");
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
