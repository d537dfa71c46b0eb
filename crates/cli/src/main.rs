// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! leasehold - bounded concurrency over an expirable-permit semaphore

mod commands;
mod completions;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, run};
use completions::CompletionsArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "leasehold",
    version,
    about = "Leasehold - run tasks under a distributed expirable-permit semaphore"
)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch of tasks
    Run(run::RunArgs),
    /// Print the effective configuration
    Config(config::ConfigArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Completions write to stdout and need no logging
    if let Commands::Completions(args) = cli.command {
        completions::generate_completions::<Cli>(args.shell);
        return Ok(());
    }

    let _log_guard = logging::setup_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Config(args) => config::config(args),
        Commands::Completions(_) => Ok(()),
    }
}
