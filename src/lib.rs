//! Stream Deck layout editor library.
//!
//! Exposes the editing core behind the `sde` CLI for use in tests and other
//! front ends.
//!
//! # Modules
//!
//! - `config`: Configuration tree (decks, pages, keys, per-application configs)
//! - `resolver`: Which config of a key is being edited
//! - `sanitize`: Pruning of empty application overrides before a push
//! - `store`: Working copy of the daemon configuration
//! - `navigator`: Page navigation state machine and key grids
//! - `handlers`: Icon/key handler catalog
//! - `clipboard`: Single-slot key clipboard
//! - `edit`: Validated edits at the input boundary
//! - `session`: Context object tying the components together
//! - `sync`: Daemon client trait, socket transport and mock
//! - `apps`: Application context discovery
//! - `settings`: Editor settings file
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod apps;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod edit;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod navigator;
pub mod resolver;
pub mod sanitize;
pub mod session;
pub mod settings;
pub mod store;
pub mod sync;
