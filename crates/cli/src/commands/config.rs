// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `leasehold config` and settings loading shared with `run`

use anyhow::Result;
use lh_core::Settings;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Config file (TOML); built-in defaults when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Load and validate settings from `path`, or the defaults
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Ok(settings)
}

pub fn config(args: ConfigArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    print!("{}", settings.to_toml()?);
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
