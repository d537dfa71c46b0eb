//! Configuration error specs
//!
//! Bad configuration is fatal and exits non-zero before any task runs.

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    cli().args(&["frobnicate"]).fails();
}

#[test]
fn zero_capacity_flag_fails() {
    cli()
        .args(&["run", "--capacity", "0"])
        .fails()
        .stderr_has("capacity must be at least 1");
}

#[test]
fn zero_workers_flag_fails() {
    cli()
        .args(&["run", "--workers", "0"])
        .fails()
        .stderr_has("pool.workers must be at least 1");
}

#[test]
fn short_lease_fails() {
    let temp = Project::empty();
    temp.file(
        "leasehold.toml",
        "[lease]\nttl = \"150ms\"\nheartbeat_interval = \"100ms\"\n",
    );

    temp.leasehold()
        .args(&["run", "--config", "leasehold.toml"])
        .fails()
        .stderr_has("twice the heartbeat interval");
}

#[test]
fn missing_config_file_fails() {
    let temp = Project::empty();
    temp.leasehold()
        .args(&["run", "--config", "absent.toml"])
        .fails()
        .stderr_has("absent.toml");
}

#[test]
fn unknown_config_key_fails() {
    let temp = Project::empty();
    temp.file("leasehold.toml", "[semaphore]\npermits = 2\n");

    temp.leasehold()
        .args(&["config", "--config", "leasehold.toml"])
        .fails()
        .stderr_has("invalid config");
}
