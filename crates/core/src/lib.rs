// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lh-core: domain model for leasehold
//!
//! This crate provides:
//! - Semaphore identities, permits and lease timing
//! - Pure state machines for the store-side lease table and for tasks
//! - Clock and id abstractions so both can be driven deterministically
//! - TOML run configuration

pub mod clock;
pub mod config;
pub mod event;
pub mod id;
pub mod lease;
pub mod permit;
pub mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ConfigError, DispatchSettings, LeaseTiming, PoolSettings, SemaphoreSettings, Settings,
    ShutdownSettings,
};
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lease::{Lease, LeaseInput, LeaseTable};
pub use permit::{Permit, PermitId, SemaphoreId};
pub use task::{AbandonReason, ReleaseCause, Task, TaskEvent, TaskId, TaskOutcome, TaskState};
