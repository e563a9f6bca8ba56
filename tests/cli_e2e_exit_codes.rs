//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: Success
//! - Exit code 1: Command failed, or a pipeline operation left a source failed
//! - Exit code 2: Invalid command-line usage (handled by clap)

mod common;
use common::prelude::*;

#[test]
fn test_exit_code_success() {
    let fixture = TestFixture::initialized();
    fixture.cmd().arg("ls").assert().code(0);
}

#[test]
fn test_exit_code_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sourcepipe");
    cmd.arg("--help").assert().code(0);
}

#[test]
fn test_exit_code_version() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sourcepipe");
    cmd.arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_exit_code_not_initialized() {
    let fixture = TestFixture::new();
    fixture.cmd().arg("ls").assert().code(1);
}

#[test]
fn test_exit_code_unknown_subcommand() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sourcepipe");
    cmd.arg("frobnicate").assert().code(2);
}

#[test]
fn test_exit_code_invalid_plugin_kind() {
    let fixture = TestFixture::initialized();
    fixture
        .cmd()
        .args(["plugin", "add", "filter", "x"])
        .assert()
        .code(2);
}
