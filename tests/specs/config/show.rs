//! `leasehold config` specs

use crate::prelude::*;

#[test]
fn defaults_describe_reference_run() {
    cli()
        .args(&["config"])
        .passes()
        .stdout_has("id = \"host:192.168.1.1:script-100\"")
        .stdout_has("capacity = 2")
        .stdout_has("heartbeat_interval = \"20s\"")
        .stdout_has("max_wait = \"1m\"")
        .stdout_has("heartbeat_workers = 4");
}

#[test]
fn file_values_are_shown() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    temp.leasehold()
        .args(&["config", "--config", "leasehold.toml"])
        .passes()
        .stdout_has("id = \"host:127.0.0.1:script-7\"")
        .stdout_has("ttl = \"400ms\"")
        .stdout_lacks("script-100");
}
