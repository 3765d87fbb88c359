//! Editing commands end to end: the binary changes the fake daemon's state.

use sde::config::{DEFAULT_CONTEXT, TextAlignment};
use sde::sync::mock::device;

use crate::common::cli::CliRunner;
use crate::common::fake_daemon::FakeDaemon;
use crate::common::fixtures::{SMALL, TestSettings, config_of, sample_modules, text_key, two_page_deck};

fn daemon() -> FakeDaemon {
    let daemon = FakeDaemon::start(
        vec![device(SMALL, 3, 2)],
        config_of(vec![two_page_deck(SMALL)]),
    );
    daemon.with_state(|s| s.modules = sample_modules());
    daemon
}

fn cli(daemon: &FakeDaemon) -> CliRunner {
    CliRunner::new().with_socket(daemon.path())
}

#[test]
fn edit_previews_without_committing() {
    let daemon = daemon();
    cli(&daemon)
        .run(&["edit", "3", "--set", "text=Build", "--set", "text_alignment=top"])
        .assert_success()
        .assert_stdout_contains("Key 3 updated");

    let live = daemon.live();
    let config = live.deck(SMALL).unwrap().pages[0].keys[3].default_config();
    assert_eq!(config.text, "Build");
    assert_eq!(config.text_alignment, Some(TextAlignment::Top));
    assert!(daemon.persisted().deck(SMALL).unwrap().pages[0].keys[3].is_blank());
    assert!(!daemon.requests().iter().any(|m| m == "commit_config"));
}

#[test]
fn edit_with_commit_persists_the_override() {
    let daemon = daemon();
    cli(&daemon)
        .run_robot(&["edit", "2", "--app", "firefox", "--set", "url=https://example.org", "--commit"])
        .assert_success()
        .assert_json_field("/committed", &serde_json::json!(true));

    let persisted = daemon.persisted();
    let key = &persisted.deck(SMALL).unwrap().pages[0].keys[2];
    assert_eq!(key.config(DEFAULT_CONTEXT).unwrap().text, "A");
    assert_eq!(key.config("firefox").unwrap().url, "https://example.org");
}

#[test]
fn copy_key_onto_another_page() {
    let daemon = daemon();
    cli(&daemon)
        .run(&["copy-key", "2", "0", "--to-page", "1", "--commit"])
        .assert_success();

    let persisted = daemon.persisted();
    let deck = persisted.deck(SMALL).unwrap();
    assert_eq!(deck.pages[1].keys[0], text_key("A"));
    assert_eq!(deck.pages[0].keys[2], text_key("A"));
    assert_eq!(daemon.device_page(SMALL), Some(1));
}

#[test]
fn page_add_and_remove() {
    let daemon = daemon();
    cli(&daemon)
        .run_robot(&["page", "add"])
        .assert_success()
        .assert_json_field("/page", &serde_json::json!(2))
        .assert_json_field("/page_count", &serde_json::json!(3));
    assert_eq!(daemon.live().deck(SMALL).unwrap().pages.len(), 3);
    assert_eq!(daemon.device_page(SMALL), Some(2));

    // The device now shows page 2, so that one goes.
    cli(&daemon)
        .run_robot(&["page", "remove"])
        .assert_success()
        .assert_json_field("/page", &serde_json::json!(1));
    assert_eq!(daemon.live().deck(SMALL).unwrap().pages.len(), 2);
}

#[test]
fn page_goto_out_of_range_fails() {
    let daemon = daemon();
    cli(&daemon)
        .run_robot(&["page", "goto", "9"])
        .assert_failure()
        .assert_stderr_contains("out of range");
    assert!(!daemon.requests().iter().any(|m| m == "set_page"));
}

#[test]
fn set_handler_and_field() {
    let daemon = daemon();
    cli(&daemon)
        .run(&["set-handler", "4", "--kind", "icon", "--name", "Clock"])
        .assert_success();
    cli(&daemon)
        .run(&["set-field", "4", "--kind", "icon", "--field", "format", "--value", "12h"])
        .assert_success();
    cli(&daemon)
        .run(&["set-field", "4", "--kind", "icon", "--field", "format", "--value", "noon"])
        .assert_failure();

    let live = daemon.live();
    let config = live.deck(SMALL).unwrap().pages[0].keys[4].default_config();
    assert_eq!(config.icon_handler, "Clock");
    assert_eq!(config.icon_handler_fields.get("format").map(String::as_str), Some("12h"));
}

#[test]
fn press_and_preview() {
    let daemon = daemon();
    cli(&daemon).run(&["press", "5"]).assert_success();
    assert_eq!(daemon.with_state(|s| s.pressed.clone()), vec![(SMALL.to_string(), 5)]);
    cli(&daemon).run(&["press", "6"]).assert_failure();

    let out = tempfile::TempDir::new().unwrap();
    let path = out.path().join("key.png");
    cli(&daemon)
        .run(&["preview", "0", "--output", path.to_str().unwrap()])
        .assert_success();
    assert!(path.is_file());
}

#[test]
fn live_preview_off_still_pushes_once() {
    let daemon = daemon();
    let settings = TestSettings::write("settings.toml", "live_preview = false\n");
    cli(&daemon)
        .run(&["--config", settings.path_str(), "edit", "0", "--set", "text=X", "--set", "command=ls"])
        .assert_success();

    let pushes = daemon.requests().iter().filter(|m| *m == "set_config").count();
    assert_eq!(pushes, 1);
    let live = daemon.live();
    assert_eq!(live.deck(SMALL).unwrap().pages[0].keys[0].default_config().command, "ls");
}

#[test]
fn reload_and_commit_reach_the_daemon() {
    let daemon = daemon();
    cli(&daemon).run(&["reload"]).assert_success();
    cli(&daemon).run(&["commit"]).assert_success();

    let requests = daemon.requests();
    assert!(requests.iter().any(|m| m == "reload_config"));
    assert!(requests.iter().any(|m| m == "commit_config"));
}

#[test]
fn editing_refuses_to_run_without_the_daemon_config() {
    let daemon = daemon();
    daemon.with_state(|s| s.failing = vec!["get_config"]);

    for args in [
        &["edit", "1", "--set", "text=X"][..],
        &["page", "add"],
        &["commit"],
        &["copy-key", "2", "0", "--commit"],
    ] {
        cli(&daemon)
            .run(args)
            .assert_failure()
            .assert_stderr_contains("get_config");
    }

    let requests = daemon.requests();
    assert!(!requests.iter().any(|m| m == "set_config" || m == "commit_config"));
    assert_eq!(daemon.persisted(), config_of(vec![two_page_deck(SMALL)]));
}

#[test]
fn read_only_commands_still_start_without_the_daemon_config() {
    let daemon = daemon();
    daemon.with_state(|s| s.failing = vec!["get_config"]);
    cli(&daemon)
        .run(&["show"])
        .assert_success()
        .assert_stdout_contains("page 1/1");
}

#[test]
fn copy_from_another_page_leaves_the_device_alone() {
    let daemon = daemon();
    cli(&daemon)
        .run(&["copy-key", "0", "5", "--from-page", "1", "--to-page", "0"])
        .assert_success();

    assert!(!daemon.requests().iter().any(|m| m == "set_page"));
    assert_eq!(daemon.device_page(SMALL), Some(0));
    let live = daemon.live();
    assert_eq!(live.deck(SMALL).unwrap().pages[0].keys[5], text_key("B"));
}
