// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `leasehold run`

use super::config::load_settings;
use crate::output::{self, OutputFormat, SummaryView};
use anyhow::Result;
use lh_adapters::{MemoryLeaseStore, TracedLeaseStore};
use lh_core::Settings;
use lh_engine::{run_batch, ShutdownSignal, SimulatedWork};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Config file (TOML); built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of tasks to dispatch
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Semaphore capacity (ignored if the semaphore already has one)
    #[arg(long)]
    pub capacity: Option<u32>,

    /// Tasks allowed to run at once
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Layer command-line overrides on top of loaded settings, then validate
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(tasks) = self.tasks {
            settings.dispatch.tasks = tasks;
        }
        if let Some(capacity) = self.capacity {
            settings.semaphore.capacity = capacity;
        }
        if let Some(workers) = self.workers {
            settings.pool.workers = workers;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(args: RunArgs) -> Result<()> {
    let settings = args.settings()?;

    let shutdown = ShutdownSignal::new();
    forward_signals(shutdown.clone())?;

    let store = TracedLeaseStore::new(MemoryLeaseStore::new());
    let work = Arc::new(SimulatedWork::from_settings(&settings.dispatch));
    let summary = run_batch(&settings, store, work, shutdown).await?;

    output::print(&SummaryView(&summary), args.format());
    Ok(())
}

/// Trigger `shutdown` on the first SIGINT or SIGTERM
fn forward_signals(shutdown: ShutdownSignal) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        shutdown.trigger();
    });
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
