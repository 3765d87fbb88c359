//! Single-slot key clipboard.

use tracing::{debug, trace};

use crate::config::Key;

/// Holds at most one key, with all of its application overrides.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<Key>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a deep copy of `key`, replacing any previous content.
    pub fn copy(&mut self, key: &Key) {
        debug!(contexts = key.application.len(), "Copied key");
        self.slot = Some(key.clone());
    }

    /// The stored key, or `target` unchanged when the clipboard is empty.
    ///
    /// Never pushes or commits; the caller decides what to do with the result.
    #[must_use]
    pub fn paste(&self, target: &Key) -> Key {
        match &self.slot {
            Some(key) => key.clone(),
            None => {
                trace!("Paste with empty clipboard");
                target.clone()
            }
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
