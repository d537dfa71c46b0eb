//! Logging specs

use crate::prelude::*;

#[test]
fn logs_go_to_stderr_by_default() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    temp.leasehold()
        .args(&["run", "--config", "leasehold.toml", "--tasks", "1"])
        .passes()
        .stderr_has("permit acquired")
        .stdout_lacks("permit acquired");
}

#[test]
fn log_file_receives_task_lifecycle() {
    let temp = Project::empty();
    temp.file("leasehold.toml", FAST_CONFIG);

    temp.leasehold()
        .args(&[
            "--log-file",
            "logs/leasehold.log",
            "run",
            "--config",
            "leasehold.toml",
        ])
        .passes()
        .stdout_has("3 tasks: 3 completed");

    let log = temp.read("logs/leasehold.log");
    assert!(log.contains("permit acquired"), "log was: {}", log);
    assert!(log.contains("shutdown phase complete"), "log was: {}", log);
}
