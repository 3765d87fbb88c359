//! [`SocketClient`] against a daemon on a real Unix socket.

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use sde::config::KeyConfig;
use sde::error::EditorError;
use sde::session::{Session, SessionOptions};
use sde::sync::mock::device;
use sde::sync::{PageEvent, SocketClient, SyncClient};

use crate::common::fake_daemon::FakeDaemon;
use crate::common::fixtures::{SMALL, config_of, sample_modules, text_key, two_page_deck};
use crate::common::init_test_logging;

const TIMEOUT: Duration = Duration::from_secs(5);

fn daemon() -> FakeDaemon {
    let daemon = FakeDaemon::start(
        vec![device(SMALL, 3, 2)],
        config_of(vec![two_page_deck(SMALL)]),
    );
    daemon.with_state(|s| s.modules = sample_modules());
    daemon
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn requests_round_trip() {
    init_test_logging();
    let daemon = daemon();
    let client = SocketClient::connect(daemon.path(), TIMEOUT).unwrap();

    let devices = client.get_devices().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].key_count(), 6);

    let modules = client.get_modules().unwrap();
    assert_eq!(modules.len(), 3);

    let mut config = client.get_config().unwrap();
    config.decks[0].pages[0].keys[1] = text_key("Z");
    client.set_config(&config).unwrap();
    assert_eq!(daemon.live(), config);
    assert_ne!(daemon.persisted(), config);

    client.commit_config().unwrap();
    assert_eq!(daemon.persisted(), config);

    client.set_page(SMALL, 1).unwrap();
    assert_eq!(daemon.device_page(SMALL), Some(1));

    client.press_button(SMALL, 4).unwrap();
    assert_eq!(daemon.with_state(|s| s.pressed.clone()), vec![(SMALL.to_string(), 4)]);

    let preview = client.get_handler_preview(SMALL, &KeyConfig::new()).unwrap();
    assert_eq!(preview.width(), 8);

    assert_eq!(
        daemon.requests(),
        [
            "get_devices",
            "get_modules",
            "get_config",
            "set_config",
            "commit_config",
            "set_page",
            "press_button",
            "get_handler_preview",
        ]
    );
}

#[test]
fn daemon_errors_name_the_method() {
    let daemon = daemon();
    daemon.with_state(|s| s.failing.push("commit_config"));
    let client = SocketClient::connect(daemon.path(), TIMEOUT).unwrap();

    let err = client.commit_config().unwrap_err();
    match err {
        EditorError::Daemon { method, message } => {
            assert_eq!(method, "commit_config");
            assert!(message.contains("refused"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The connection stays usable after a refused request.
    assert!(client.get_devices().is_ok());
}

#[test]
fn missing_socket_is_unavailable() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.sock");

    let err = SocketClient::connect(&path, TIMEOUT).err().unwrap();

    assert!(matches!(err, EditorError::DaemonUnavailable { .. }));
    assert!(err.is_user_recoverable());
    assert!(err.suggestion().is_some());
}

#[test]
fn page_events_reach_the_listener() {
    let daemon = daemon();
    let client = SocketClient::connect(daemon.path(), TIMEOUT).unwrap();
    let (tx, rx) = mpsc::channel();

    client
        .register_page_listener(Box::new(move |event: PageEvent| {
            let _ = tx.send(event);
        }))
        .unwrap();
    assert!(wait_for(|| daemon.subscriber_count() == 1));

    daemon.emit_page_change(SMALL, 1);

    let event = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(
        event,
        PageEvent {
            serial: SMALL.to_string(),
            page: 1
        }
    );
}

#[test]
fn session_follows_the_device_over_the_socket() {
    let daemon = daemon();
    let client = Arc::new(SocketClient::connect(daemon.path(), TIMEOUT).unwrap());
    let mut session = Session::start(client, SessionOptions::default()).unwrap();
    assert!(session.warnings().is_empty());
    assert!(wait_for(|| daemon.subscriber_count() == 1));

    daemon.emit_page_change(SMALL, 1);
    assert!(wait_for(|| session.process_events() == 1));

    assert_eq!(session.active_page(), 1);
    assert_eq!(session.grid()[0].key, text_key("B"));
    assert!(!daemon.requests().iter().any(|m| m == "set_page"));
}
