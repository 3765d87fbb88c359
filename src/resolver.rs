//! Override resolution: which [`KeyConfig`] of a key is being edited.
//!
//! Keys carry one config per application context. The empty context is the
//! global default; named contexts override it while that application has
//! focus. Resolving a context the key lacks creates an empty entry for it.

use tracing::trace;

use crate::config::{Key, KeyConfig};

/// Result of resolving a context on a key.
#[derive(Debug)]
pub struct Resolved<'a> {
    /// The config stored under the requested context.
    pub config: &'a mut KeyConfig,
    /// True if the entry did not exist and was just inserted.
    pub created: bool,
}

/// Return the config for `context`, inserting an empty one if missing.
pub fn resolve<'a>(key: &'a mut Key, context: &str) -> Resolved<'a> {
    let created = !key.application.contains_key(context);
    if created {
        trace!(context = %context, "Creating empty override");
    }
    let config = key.application.entry(context.to_string()).or_default();
    Resolved { config, created }
}

/// Context a grid slot should edit after its key was refreshed.
///
/// A slot whose key changed identity starts over on the default context;
/// an unchanged key keeps the context it was being edited under, so
/// refreshing twice gives the same result.
#[must_use]
pub fn context_after_refresh<'a>(previous: &Key, current: &Key, slot_context: &'a str) -> &'a str {
    if previous.same_identity(current) {
        slot_context
    } else {
        crate::config::DEFAULT_CONTEXT
    }
}
