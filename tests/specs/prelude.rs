//! Shared helpers for CLI specs

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Millisecond-scale run: three tasks, capacity two, all finish quickly
pub const FAST_CONFIG: &str = r#"
[semaphore]
id = "host:127.0.0.1:script-7"
capacity = 2

[lease]
ttl = "400ms"
heartbeat_interval = "100ms"
max_wait = "2s"

[pool]
workers = 3
heartbeat_workers = 2

[dispatch]
tasks = 3
spacing = "10ms"
work_min = "20ms"
work_max = "60ms"

[shutdown]
task_grace = "1s"
heartbeat_grace = "1s"
store_grace = "1s"
"#;

/// One slot held for 300ms while two late arrivals give up after 50ms
pub const CONTENDED_CONFIG: &str = r#"
[semaphore]
capacity = 1

[lease]
ttl = "400ms"
heartbeat_interval = "100ms"
max_wait = "50ms"

[dispatch]
tasks = 3
spacing = "50ms"
work_min = "300ms"
work_max = "300ms"
"#;

/// A scratch directory to hold config and log files
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel` under the project
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    /// `leasehold` running inside the project directory
    pub fn leasehold(&self) -> CliBuilder {
        let mut builder = cli();
        builder.cmd.current_dir(self.path());
        builder
    }
}

/// `leasehold` with a quiet log filter
pub fn cli() -> CliBuilder {
    let mut cmd = Command::cargo_bin("leasehold").unwrap();
    cmd.env("RUST_LOG", "info");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct RunAssert {
    assert: Assert,
}

impl RunAssert {
    pub fn stdout_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(expected)),
        }
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        Self {
            assert: self
                .assert
                .stdout(predicate::str::contains(unexpected).not()),
        }
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(expected)),
        }
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }
}
