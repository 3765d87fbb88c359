//! Page structure edits: add, remove, reset.

use std::sync::Arc;

use sde::session::{Session, SessionOptions};
use sde::error::EditorError;
use sde::sync::mock::{MockConfig, MockDaemon, Operation, device};

use crate::common::fixtures::{SMALL, config_of, page_with, text_key, two_page_deck};

fn start_with_pages(pages: usize) -> (Arc<MockDaemon>, Session) {
    let mut deck = two_page_deck(SMALL);
    while deck.pages.len() < pages {
        let label = format!("P{}", deck.pages.len());
        deck.pages.push(page_with(6, &[(0, text_key(&label))]));
    }
    deck.pages.truncate(pages);
    let mock = Arc::new(MockDaemon::new(
        vec![device(SMALL, 3, 2)],
        config_of(vec![deck]),
    ));
    let session = Session::start(mock.clone(), SessionOptions::default()).unwrap();
    mock.clear_operations();
    (mock, session)
}

fn page_count(mock: &MockDaemon) -> usize {
    mock.live_config().deck(SMALL).map_or(0, |d| d.pages.len())
}

#[test]
fn removing_the_only_page_resets_it() {
    let (mock, mut session) = start_with_pages(1);

    let shown = session.remove_page().unwrap();

    assert_eq!(shown, 0);
    assert_eq!(page_count(&mock), 1);
    assert!(session.grid().iter().all(|slot| slot.key.is_blank()));
    let live = mock.live_config();
    assert_eq!(live.deck(SMALL).unwrap().pages[0].keys.len(), 6);
}

#[test]
fn removing_a_middle_page_shifts_later_pages_down() {
    let (mock, mut session) = start_with_pages(4);
    session.go_to_page(2).unwrap();

    let shown = session.remove_page().unwrap();

    assert_eq!(shown, 1);
    assert_eq!(session.active_page(), 1);
    assert_eq!(page_count(&mock), 3);
    let live = mock.live_config();
    assert_eq!(live.deck(SMALL).unwrap().pages[2].keys[0], text_key("P3"));
    assert_eq!(session.grid()[0].key, text_key("B"));
    mock.assert_contains(&Operation::SetPage {
        serial: SMALL.into(),
        page: 1,
    });
}

#[test]
fn removing_the_first_page_shows_the_new_first() {
    let (mock, mut session) = start_with_pages(3);

    let shown = session.remove_page().unwrap();

    assert_eq!(shown, 0);
    assert_eq!(page_count(&mock), 2);
    assert_eq!(session.grid()[0].key, text_key("B"));
}

#[test]
fn added_page_is_appended_blank_and_shown() {
    let (mock, mut session) = start_with_pages(2);

    let page = session.add_page().unwrap();

    assert_eq!(page, 2);
    assert_eq!(session.active_page(), 2);
    assert_eq!(session.page_label(), "3/3");
    assert_eq!(page_count(&mock), 3);
    assert!(session.grid().iter().all(|slot| slot.key.is_blank()));
    assert_eq!(mock.device_page(SMALL), Some(2));
}

#[test]
fn reset_empties_only_the_shown_page() {
    let (mock, mut session) = start_with_pages(2);

    session.reset_page().unwrap();

    let live = mock.live_config();
    let deck = live.deck(SMALL).unwrap();
    assert!(deck.pages[0].keys.iter().all(|k| k.is_blank()));
    assert_eq!(deck.pages[1].keys[0], text_key("B"));
    assert!(session.grid()[2].key.is_blank());
}

#[test]
fn refused_push_leaves_pages_and_navigation_alone() {
    let (mock, mut session) = start_with_pages(2);
    session.go_to_page(1).unwrap();
    let before = session.store().config().clone();
    mock.clear_operations();

    for attempt in ["remove", "add", "reset"] {
        mock.inject_error(EditorError::Other("set_config refused".into()));
        let result = match attempt {
            "remove" => session.remove_page().map(|_| ()),
            "add" => session.add_page().map(|_| ()),
            _ => session.reset_page(),
        };
        assert!(result.is_err(), "{attempt} should fail");
        assert_eq!(session.store().config(), &before, "{attempt} changed the working copy");
        assert_eq!(session.active_page(), 1);
        assert_eq!(session.grid()[0].key, text_key("B"));
    }
    assert!(session.current_config().is_ok());
    mock.assert_no_set_page();
    assert_eq!(page_count(&mock), 2);
}

#[test]
fn removal_stays_in_range_when_the_device_does_not_follow() {
    let mut deck = two_page_deck(SMALL);
    deck.pages.push(page_with(6, &[(0, text_key("P2"))]));
    let mut info = device(SMALL, 3, 2);
    info.page = 2;
    let mock = Arc::new(
        MockDaemon::new(vec![info], config_of(vec![deck])).with_config(MockConfig {
            failing_methods: vec!["set_page"],
            ..MockConfig::connected()
        }),
    );
    let mut session = Session::start(mock.clone(), SessionOptions::default()).unwrap();
    assert_eq!(session.active_page(), 2);

    assert!(session.remove_page().is_err());

    assert_eq!(page_count(&mock), 2);
    assert_eq!(session.active_page(), 1);
    assert_eq!(session.page_label(), "2/2");
    assert_eq!(session.grid()[0].key, text_key("B"));
    assert!(session.current_config().is_ok());
}
