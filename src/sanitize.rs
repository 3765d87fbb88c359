//! Pruning of empty application overrides before a preview push.

use tracing::debug;

use crate::config::{Config, DEFAULT_CONTEXT};

/// Remove every named-context entry whose config is all defaults.
///
/// The default context entry is always kept. Returns the number of entries
/// removed.
pub fn sanitize(config: &mut Config) -> usize {
    let mut removed = 0;
    for deck in &mut config.decks {
        for page in &mut deck.pages {
            for key in &mut page.keys {
                let before = key.application.len();
                key.application
                    .retain(|context, cfg| context == DEFAULT_CONTEXT || !cfg.is_empty());
                removed += before - key.application.len();
            }
        }
    }
    if removed > 0 {
        debug!(removed, "Pruned empty application overrides");
    }
    removed
}

/// Sanitized copy of `config`, leaving the original untouched.
#[must_use]
pub fn sanitized(config: &Config) -> Config {
    let mut copy = config.clone();
    sanitize(&mut copy);
    copy
}
