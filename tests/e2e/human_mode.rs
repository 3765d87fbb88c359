//! Human-mode output.

use sde::sync::mock::device;

use crate::common::cli::CliRunner;
use crate::common::fake_daemon::FakeDaemon;
use crate::common::fixtures::{SMALL, config_of, two_page_deck};

fn assert_no_ansi(text: &str) {
    assert!(!text.contains('\u{1b}'), "Unexpected ANSI escape in:\n{text}");
}

#[test]
fn help_lists_the_editing_commands() {
    let result = CliRunner::new().run(&["--help"]);
    result.assert_success();
    for command in ["devices", "show", "edit", "copy-key", "page", "commit", "watch"] {
        result.assert_stdout_contains(command);
    }
}

#[test]
fn version_is_plain_text() {
    let result = CliRunner::new().with_env("NO_COLOR", "1").run(&["version"]);
    result.assert_success().assert_stdout_contains("sde ");
    assert!(serde_json::from_str::<serde_json::Value>(result.stdout.trim()).is_err());
    assert_no_ansi(&result.stdout);
}

#[test]
fn show_draws_the_grid() {
    let daemon = FakeDaemon::start(
        vec![device(SMALL, 3, 2)],
        config_of(vec![two_page_deck(SMALL)]),
    );
    let result = CliRunner::new()
        .with_socket(daemon.path())
        .with_env("NO_COLOR", "1")
        .run(&["show"]);
    result
        .assert_success()
        .assert_stdout_contains("page 1/2")
        .assert_stdout_contains("[ 2] A");
    assert_no_ansi(&result.stdout);
}

#[test]
fn show_key_lists_contexts_and_builtins() {
    let daemon = FakeDaemon::start(
        vec![device(SMALL, 3, 2)],
        config_of(vec![two_page_deck(SMALL)]),
    );
    CliRunner::new()
        .with_socket(daemon.path())
        .run(&["show", "--key", "2"])
        .assert_success()
        .assert_stdout_contains("icon handler: Default")
        .assert_stdout_contains("text: A");
}

#[test]
fn missing_daemon_prints_a_hint() {
    let dir = tempfile::TempDir::new().unwrap();
    CliRunner::new()
        .with_socket(&dir.path().join("gone.sock"))
        .with_env("NO_COLOR", "1")
        .run(&["devices"])
        .assert_failure()
        .assert_stderr_contains("Error")
        .assert_stderr_contains("Hint");
}

#[test]
fn completions_are_generated_without_a_daemon() {
    assert_cmd::Command::cargo_bin("sde")
        .unwrap()
        .args(["completions", "bash"])
        .env("SDE_SOCKET", "/nonexistent/daemon.sock")
        .assert()
        .success()
        .stdout(predicates::str::contains("_sde"));
}

#[test]
fn unknown_setting_name_is_rejected_before_connecting() {
    assert_cmd::Command::cargo_bin("sde")
        .unwrap()
        .args(["--no-color", "edit", "0", "--set", "colour=red"])
        .env("SDE_SOCKET", "/nonexistent/daemon.sock")
        .env("XDG_CONFIG_HOME", "/nonexistent/config")
        .env("RUST_LOG", "off")
        .assert()
        .failure()
        .stderr(predicates::str::contains("no field named 'colour'"));
}
