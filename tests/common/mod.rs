//! Shared test utilities for the layout editor.
//!
//! - `cli`: runner for the `sde` binary with fluent assertions
//! - `fake_daemon`: a deck daemon served over a real Unix socket
//! - `fixtures`: sample configs, modules and temporary files
#![allow(dead_code)]

pub mod cli;
pub mod fixtures;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
