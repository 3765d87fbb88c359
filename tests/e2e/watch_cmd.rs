//! The watch command.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sde::sync::mock::device;

use crate::common::cli::CliRunner;
use crate::common::fake_daemon::FakeDaemon;
use crate::common::fixtures::{SMALL, config_of, two_page_deck};

fn daemon() -> FakeDaemon {
    FakeDaemon::start(
        vec![device(SMALL, 3, 2)],
        config_of(vec![two_page_deck(SMALL)]),
    )
}

#[test]
fn watch_timeout_exits_quickly() {
    let daemon = daemon();
    let start = Instant::now();
    let result = CliRunner::new()
        .with_socket(daemon.path())
        .run_robot(&["watch", "--timeout=1"]);
    result.assert_success();
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(result.stdout.trim().is_empty());
}

#[test]
fn watch_once_reports_a_device_page_change() {
    let daemon = daemon();
    let home = tempfile::TempDir::new().unwrap();
    let child = Command::new(env!("CARGO_BIN_EXE_sde"))
        .args(["--robot", "watch", "--once", "--timeout=20"])
        .env("SDE_SOCKET", daemon.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("RUST_LOG", "off")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while daemon.subscriber_count() == 0 {
        assert!(Instant::now() < deadline, "watch never subscribed");
        std::thread::sleep(Duration::from_millis(20));
    }
    daemon.emit_page_change(SMALL, 1);

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().expect("no event line");
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["event"], "page_changed");
    assert_eq!(event["serial"], SMALL);
    assert_eq!(event["page"], 1);
    assert!(event["timestamp"].is_string());
    assert!(!daemon.requests().iter().any(|m| m == "set_page"));
}
