//! Catalog of icon and key handlers.
//!
//! Fetched from the daemon once at startup and immutable afterwards. The
//! synthetic `Default` module always comes first.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{HandlerKind, Module};
use crate::error::{EditorError, Result};
use crate::sync::SyncClient;

/// Immutable handler catalog for one session.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerRegistry {
    modules: Vec<Module>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::from_modules(Vec::new())
    }
}

impl HandlerRegistry {
    /// Build a registry from daemon-reported modules, prepending `Default`.
    ///
    /// A daemon module that is itself named `Default` is dropped so lookups
    /// stay unambiguous.
    #[must_use]
    pub fn from_modules(reported: Vec<Module>) -> Self {
        let mut modules = Vec::with_capacity(reported.len() + 1);
        modules.push(Module::builtin());
        for module in reported {
            if module.is_builtin() {
                warn!("Daemon reported a module named Default; ignoring it");
                continue;
            }
            modules.push(module);
        }
        debug!(count = modules.len(), "Handler registry built");
        Self { modules }
    }

    /// Fetch the module catalog from the daemon.
    ///
    /// On failure the registry holds only `Default` and the error is handed
    /// back for the caller to surface.
    pub fn initialize(client: &dyn SyncClient) -> (Self, Option<EditorError>) {
        match client.get_modules() {
            Ok(modules) => {
                info!(count = modules.len(), "Loaded handler modules");
                (Self::from_modules(modules), None)
            }
            Err(err) => {
                warn!(error = %err, "Unable to get handlers");
                (Self::default(), Some(err))
            }
        }
    }

    /// All modules, `Default` first.
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Exact-name lookup. Never falls back to `Default`.
    pub fn lookup(&self, name: &str) -> Result<&Module> {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| {
                warn!(name, "Handler not found");
                EditorError::HandlerNotFound {
                    name: name.to_string(),
                }
            })
    }

    /// Lookup that also requires the module to support `kind`.
    pub fn lookup_for(&self, name: &str, kind: HandlerKind) -> Result<&Module> {
        let module = self.lookup(name)?;
        if !module.supports(kind) {
            warn!(name, %kind, "Handler lacks capability");
            return Err(EditorError::HandlerIncapable {
                name: name.to_string(),
                kind: kind.to_string(),
            });
        }
        Ok(module)
    }

    /// Names of modules usable for `kind`, in catalog order.
    #[must_use]
    pub fn names_for(&self, kind: HandlerKind) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|m| m.supports(kind))
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Names of icon-capable modules.
    #[must_use]
    pub fn icon_handlers(&self) -> Vec<&str> {
        self.names_for(HandlerKind::Icon)
    }

    /// Names of key-capable modules.
    #[must_use]
    pub fn key_handlers(&self) -> Vec<&str> {
        self.names_for(HandlerKind::Key)
    }
}
