// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Leasehold coordination engine
//!
//! Holds permits against a [`lh_adapters::LeaseStore`], keeps them alive with
//! a shared heartbeat pool, runs tasks inside the permit window, and tears
//! everything down in order.

mod dispatcher;
mod error;
mod heartbeat;
mod holder;
mod pool;
mod run;
mod runner;
mod shutdown;
mod signal;
mod timers;
mod work;

#[cfg(test)]
mod testing;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{SchedulerError, WorkError};
pub use heartbeat::{HeartbeatHandle, HeartbeatScheduler, HeartbeatStats, RenewalLog};
pub use holder::{Acquisition, HeldPermit, PermitHolder};
pub use pool::WorkerPool;
pub use run::{run_batch, OutcomeCounts, RunSummary};
pub use runner::{TaskReport, TaskRunner};
pub use shutdown::{Phase, PhaseReport, PhaseStatus, ShutdownCoordinator, ShutdownReport};
pub use signal::{Interrupt, ShutdownSignal};
pub use work::{SimulatedWork, Work};
