//! Help and completions specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("config")
        .stdout_has("completions")
        .stdout_has("--log-file");
}

#[test]
fn run_help_lists_overrides() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--tasks")
        .stdout_has("--capacity")
        .stdout_has("--workers")
        .stdout_has("--json");
}

#[test]
fn bash_completions_name_the_binary() {
    cli()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("leasehold");
}

#[test]
fn unknown_shell_is_rejected() {
    cli().args(&["completions", "tcsh"]).fails();
}
