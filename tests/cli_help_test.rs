//! Smoke tests for the CLI surface: help output renders and names the
//! commands the core exposes.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_lifecycle_commands() {
    Command::cargo_bin("leitstand")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("work order"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("complete"))
        .stdout(predicate::str::contains("inbox"));
}

#[test]
fn task_subcommand_has_its_own_help() {
    Command::cargo_bin("leitstand")
        .unwrap()
        .args(["task", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("toggle"));
}

#[test]
fn unknown_command_fails_with_usage() {
    Command::cargo_bin("leitstand")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
