// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::error::WorkError;
use crate::heartbeat::HeartbeatScheduler;
use crate::holder::PermitHolder;
use crate::runner::TaskRunner;
use crate::signal::ShutdownSignal;
use crate::work::Work;
use async_trait::async_trait;
use lh_adapters::{FakeLeaseStore, LeaseStore};
use lh_core::{LeaseTiming, SemaphoreId, SystemClock, TaskId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn sem() -> SemaphoreId {
    SemaphoreId::new("host:192.168.1.1:script-100")
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Tracks how many units of work run at once
#[derive(Default)]
pub struct Gauge {
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl Gauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

struct Running<'a>(&'a Gauge);

impl<'a> Running<'a> {
    fn enter(gauge: &'a Gauge) -> Self {
        let now = gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
        gauge.peak.fetch_max(now, Ordering::SeqCst);
        Running(gauge)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Work that records concurrency in a [`Gauge`] around an inner unit of work
pub struct Tracked<W> {
    pub gauge: Arc<Gauge>,
    pub inner: W,
}

impl<W> Tracked<W> {
    pub fn new(inner: W) -> Self {
        Self {
            gauge: Arc::new(Gauge::default()),
            inner,
        }
    }
}

#[async_trait]
impl<W: Work> Work for Tracked<W> {
    async fn run(&self, task: &TaskId) -> Result<(), WorkError> {
        let _running = Running::enter(&self.gauge);
        let result = self.inner.run(task).await;
        self.gauge.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Sleeps a fixed duration
pub struct Sleep(pub Duration);

#[async_trait]
impl Work for Sleep {
    async fn run(&self, _task: &TaskId) -> Result<(), WorkError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

/// Panics after a short delay
pub struct Panics;

#[async_trait]
impl Work for Panics {
    async fn run(&self, _task: &TaskId) -> Result<(), WorkError> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        panic!("work exploded");
    }
}

/// Store, scheduler and signal wired together over one semaphore
pub struct Fixture {
    pub store: FakeLeaseStore,
    pub heartbeats: HeartbeatScheduler,
    pub signal: ShutdownSignal,
}

impl Fixture {
    pub async fn new(capacity: u32) -> Self {
        let store = FakeLeaseStore::new();
        store.set_capacity(&sem(), capacity).await.unwrap();
        Self {
            heartbeats: HeartbeatScheduler::start(store.clone(), 4),
            store,
            signal: ShutdownSignal::new(),
        }
    }

    pub fn runner<W: Work + ?Sized>(
        &self,
        work: Arc<W>,
        timing: LeaseTiming,
    ) -> TaskRunner<FakeLeaseStore, W, SystemClock> {
        let holder = PermitHolder::new(
            self.store.clone(),
            self.heartbeats.clone(),
            sem(),
            timing,
        );
        TaskRunner::new(holder, work, SystemClock, self.signal.subscribe())
    }
}

/// 30s lease renewed every 10s, 60s max wait
pub fn timing() -> LeaseTiming {
    LeaseTiming::new(secs(30), secs(10))
        .unwrap()
        .with_max_wait(secs(60))
}
