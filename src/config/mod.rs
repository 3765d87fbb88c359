//! Configuration data model shared with the deck daemon.
//!
//! The tree is `Config → Deck → Page → Key → KeyConfig`. The daemon owns the
//! persisted form; the editor keeps a working copy of the same shape and
//! treats it as an opaque document it reads and writes whole.

mod key_config;
mod module;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use key_config::{DEFAULT_HANDLER, KeyConfig, TextAlignment, is_builtin_handler};
pub use module::{Field, FieldKind, HandlerKind, Module};

/// Application context of the global (non-application-specific) config.
pub const DEFAULT_CONTEXT: &str = "";

/// Root of the configuration: one deck per registered device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Decks in device registration order.
    #[serde(default)]
    pub decks: Vec<Deck>,
}

impl Config {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a deck by serial.
    #[must_use]
    pub fn deck(&self, serial: &str) -> Option<&Deck> {
        self.decks.iter().find(|d| d.serial == serial)
    }

    /// Find a deck by serial for mutation.
    pub fn deck_mut(&mut self, serial: &str) -> Option<&mut Deck> {
        self.decks.iter_mut().find(|d| d.serial == serial)
    }
}

/// Persisted state of one physical device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Deck {
    /// Stable hardware serial number.
    pub serial: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Deck {
    /// Create a deck with a single empty page of `key_count` keys.
    #[must_use]
    pub fn new(serial: impl Into<String>, key_count: usize) -> Self {
        Self {
            serial: serial.into(),
            pages: vec![Page::empty(key_count)],
        }
    }
}

/// One grid's worth of keys in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Page {
    pub keys: Vec<Key>,
}

impl Page {
    /// A page of `key_count` empty keys.
    #[must_use]
    pub fn empty(key_count: usize) -> Self {
        Self {
            keys: vec![Key::default(); key_count],
        }
    }

    /// Key at `index`, or an empty key if the page is shorter.
    #[must_use]
    pub fn key_or_empty(&self, index: usize) -> Key {
        self.keys.get(index).cloned().unwrap_or_default()
    }

    /// Grow the page with empty keys until it holds `len` keys.
    ///
    /// Never shrinks.
    pub fn ensure_length(&mut self, len: usize) {
        if self.keys.len() < len {
            self.keys.resize_with(len, Key::default);
        }
    }
}

/// One button position holding a config per application context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Key {
    #[serde(default)]
    pub application: BTreeMap<String, KeyConfig>,
}

impl Key {
    /// A key with only a default-context config.
    #[must_use]
    pub fn with_default(config: KeyConfig) -> Self {
        let mut application = BTreeMap::new();
        application.insert(DEFAULT_CONTEXT.to_string(), config);
        Self { application }
    }

    /// Config for `context`, if one is stored.
    #[must_use]
    pub fn config(&self, context: &str) -> Option<&KeyConfig> {
        self.application.get(context)
    }

    /// Config for the default context, treating a missing entry as empty.
    #[must_use]
    pub fn default_config(&self) -> KeyConfig {
        self.application
            .get(DEFAULT_CONTEXT)
            .cloned()
            .unwrap_or_default()
    }

    /// True when no context holds a non-empty config.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.application.values().all(KeyConfig::is_empty)
    }

    /// Value equality that ignores empty context entries.
    ///
    /// A key that only gained lazily created empty entries keeps its identity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        let meaningful = |key: &Self| {
            key.application
                .iter()
                .filter(|(_, cfg)| !cfg.is_empty())
                .count()
        };
        meaningful(self) == meaningful(other)
            && self
                .application
                .iter()
                .filter(|(_, cfg)| !cfg.is_empty())
                .all(|(ctx, cfg)| other.application.get(ctx) == Some(cfg))
    }
}
