//! Page navigation, local and device-originated.

use std::sync::Arc;

use sde::config::{Deck, Page};
use sde::session::{Session, SessionOptions};
use sde::sync::mock::{MockDaemon, Operation, device};

use crate::common::fixtures::{LARGE, SMALL, config_of, text_key, two_page_deck};

fn two_device_mock() -> Arc<MockDaemon> {
    let large = Deck {
        serial: LARGE.to_string(),
        pages: vec![Page::empty(15), Page::empty(15), Page::empty(15)],
    };
    Arc::new(MockDaemon::new(
        vec![device(SMALL, 3, 2), device(LARGE, 5, 3)],
        config_of(vec![two_page_deck(SMALL), large]),
    ))
}

fn start(mock: &Arc<MockDaemon>) -> Session {
    let session = Session::start(mock.clone(), SessionOptions::default()).unwrap();
    mock.clear_operations();
    session
}

#[test]
fn device_page_change_refreshes_without_echo() {
    let mock = two_device_mock();
    let mut session = start(&mock);
    assert_eq!(session.active_serial().unwrap(), SMALL);

    mock.emit_page_change(SMALL, 1);
    assert_eq!(session.active_page(), 0, "events apply on drain, not on arrival");

    assert_eq!(session.process_events(), 1);
    assert_eq!(session.active_page(), 1);
    assert_eq!(session.grid()[0].key, text_key("B"));
    assert_eq!(session.page_label(), "2/2");
    mock.assert_no_set_page();
}

#[test]
fn repeated_event_for_shown_page_is_ignored() {
    let mock = two_device_mock();
    let mut session = start(&mock);

    mock.emit_page_change(SMALL, 0);
    assert_eq!(session.process_events(), 0);
    assert_eq!(mock.operation_count(), 0);
}

#[test]
fn event_beyond_last_page_is_clamped() {
    let mock = two_device_mock();
    let mut session = start(&mock);

    mock.emit_page_change(SMALL, 7);
    session.process_events();

    assert_eq!(session.active_page(), 1);
    mock.assert_no_set_page();
}

#[test]
fn inactive_device_event_is_remembered_for_the_switch() {
    let mock = two_device_mock();
    let mut session = start(&mock);

    mock.emit_page_change(LARGE, 2);
    assert_eq!(session.process_events(), 0);
    assert_eq!(session.active_serial().unwrap(), SMALL);
    assert_eq!(session.active_page(), 0);

    session.select_device(LARGE).unwrap();
    assert_eq!(session.active_page(), 2);
    assert_eq!(session.grid().len(), 15);
    assert_eq!(session.page_label(), "3/3");
    mock.assert_no_set_page();
}

#[test]
fn local_moves_tell_the_daemon_and_stop_at_the_ends() {
    let mock = two_device_mock();
    let mut session = start(&mock);

    assert!(!session.previous_page().unwrap());
    assert!(session.next_page().unwrap());
    assert!(!session.next_page().unwrap());
    assert!(session.previous_page().unwrap());

    mock.assert_operations(&[
        Operation::SetPage {
            serial: SMALL.into(),
            page: 1,
        },
        Operation::SetPage {
            serial: SMALL.into(),
            page: 0,
        },
    ]);
    assert_eq!(mock.device_page(SMALL), Some(0));
}

#[test]
fn failed_set_page_leaves_the_grid_alone() {
    let mock = two_device_mock();
    let mut session = start(&mock);
    mock.inject_error(sde::error::EditorError::Daemon {
        method: "set_page".into(),
        message: "busy".into(),
    });

    assert!(session.go_to_page(1).is_err());
    assert_eq!(session.active_page(), 0);
    assert_eq!(session.grid()[2].key, text_key("A"));
}

#[test]
fn application_context_survives_refresh_of_unchanged_keys() {
    let mock = two_device_mock();
    let mut session = start(&mock);
    session.select_application("firefox");

    // The device bounces to page 1 and back: page 0's keys are rebuilt
    // against page 1's grid, so slots whose key changed fall back.
    mock.emit_page_change(SMALL, 1);
    session.process_events();
    mock.emit_page_change(SMALL, 0);
    session.process_events();

    let contexts: Vec<&str> = session.grid().iter().map(|s| s.context.as_str()).collect();
    // Slots 0 and 2 differ between the pages.
    assert_eq!(contexts[0], "");
    assert_eq!(contexts[2], "");
    // Blank on both pages: identity kept, context kept.
    assert_eq!(contexts[1], "firefox");
    assert_eq!(contexts[5], "firefox");
}

#[test]
fn start_needs_devices_but_not_a_subscription() {
    let mock = Arc::new(MockDaemon::single_device(SMALL, 3, 2));
    mock.inject_error(sde::error::EditorError::Other("no devices".into()));
    assert!(Session::start(mock.clone(), SessionOptions::default()).is_err());

    let mock = Arc::new(MockDaemon::single_device(SMALL, 3, 2));
    let session = Session::start(
        mock.clone(),
        SessionOptions {
            subscribe: false,
            ..SessionOptions::default()
        },
    )
    .unwrap();
    assert!(session.warnings().is_empty());
    assert!(
        !mock
            .operations()
            .contains(&Operation::RegisterPageListener)
    );
}
