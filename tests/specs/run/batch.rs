//! `leasehold run` specs

use crate::prelude::*;

#[test]
fn fast_batch_completes_every_task() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    temp.leasehold()
        .args(&["run", "--config", "leasehold.toml"])
        .passes()
        .stdout_has("semaphore host:127.0.0.1:script-7 (capacity 2)")
        .stdout_has("task-1")
        .stdout_has("task-3")
        .stdout_has("3 tasks: 3 completed, 0 no slot")
        .stdout_has("shutdown: tasks clean, heartbeats clean, store clean");
}

#[test]
fn json_summary_reports_counts() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    let out = temp
        .leasehold()
        .args(&["run", "--config", "leasehold.toml", "--json"])
        .passes()
        .stdout_has("\"completed\": 3")
        .stdout_has("\"interrupted\": false")
        .stdout();

    assert!(out.trim_start().starts_with('{'), "not JSON: {}", out);
    assert_eq!(out.matches("\"outcome\": \"completed\"").count(), 3);
}

#[test]
fn task_flag_overrides_config() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    temp.leasehold()
        .args(&["run", "--config", "leasehold.toml", "--tasks", "1"])
        .passes()
        .stdout_has("1 tasks: 1 completed")
        .stdout_lacks("task-2");
}

#[test]
fn late_arrivals_give_up_without_failing_the_run() {
    let temp = Project::empty();
    temp.file("leasehold.toml", CONTENDED_CONFIG);

    temp.leasehold()
        .args(&["run", "--config", "leasehold.toml", "--json"])
        .passes()
        .stdout_has("\"completed\": 1")
        .stdout_has("\"no_slot\": 2");
}
