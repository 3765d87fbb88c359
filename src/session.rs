//! Editing session.
//!
//! [`Session`] is built once at startup and owns every core component: the
//! daemon client, handler registry, working copy, navigator and clipboard.
//! Everything the user does goes through it on one thread.

use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::apps::context_for;
use crate::clipboard::Clipboard;
use crate::config::{DEFAULT_CONTEXT, HandlerKind, Key, KeyConfig};
use crate::edit::{BuiltinEdit, choose_handler, set_handler_field};
use crate::error::{EditorError, Result};
use crate::handlers::HandlerRegistry;
use crate::navigator::{GridSlot, PageNavigator};
use crate::resolver::resolve;
use crate::store::ConfigStore;
use crate::sync::{DeviceInfo, SharedClient};

/// How a session starts.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Device to activate; the first reported device when `None`.
    pub device: Option<String>,
    /// Push the working copy after each edit.
    pub live_preview: bool,
    /// Subscribe to daemon page changes.
    pub subscribe: bool,
    /// Fail instead of starting on an empty working copy when the config
    /// cannot be fetched. Needed by anything that pushes or commits.
    pub require_config: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device: None,
            live_preview: true,
            subscribe: true,
            require_config: false,
        }
    }
}

/// Context object for one editor run.
pub struct Session {
    client: SharedClient,
    registry: HandlerRegistry,
    store: ConfigStore,
    navigator: PageNavigator,
    clipboard: Clipboard,
    selected_key: usize,
    live_preview: bool,
    warnings: Vec<EditorError>,
}

impl Session {
    /// Connect the components and activate a device.
    ///
    /// Failing to list devices is fatal, as is a failed config fetch when
    /// [`SessionOptions::require_config`] is set. Otherwise a failed config
    /// fetch, module fetch or subscription is kept in [`Self::warnings`] and
    /// the session starts with what it has.
    #[instrument(skip(client))]
    pub fn start(client: SharedClient, options: SessionOptions) -> Result<Self> {
        let devices = client.get_devices()?;
        info!(devices = devices.len(), "Starting session");

        let mut warnings = Vec::new();
        let (registry, registry_error) = HandlerRegistry::initialize(client.as_ref());
        warnings.extend(registry_error);

        let mut store = ConfigStore::new(client.clone(), devices);
        if let Err(err) = store.load() {
            if options.require_config {
                return Err(err);
            }
            warnings.push(err);
        }

        let navigator = PageNavigator::new(client.clone());
        if options.subscribe {
            if let Err(err) = client.register_page_listener(navigator.listener()) {
                warn!(error = %err, "Page changes on the device will not be followed");
                warnings.push(err);
            }
        }

        let mut session = Self {
            client,
            registry,
            store,
            navigator,
            clipboard: Clipboard::new(),
            selected_key: 0,
            live_preview: options.live_preview,
            warnings,
        };

        let initial = match options.device {
            Some(serial) => Some(serial),
            None => session.store.devices().first().map(|d| d.serial.clone()),
        };
        match initial {
            Some(serial) => session.select_device(&serial)?,
            None => warn!("Daemon reports no devices"),
        }
        Ok(session)
    }

    // === Accessors ===

    /// Non-fatal errors collected during startup.
    #[must_use]
    pub fn warnings(&self) -> &[EditorError] {
        &self.warnings
    }

    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    #[must_use]
    pub const fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    #[must_use]
    pub const fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceInfo] {
        self.store.devices()
    }

    /// Serial of the active device.
    pub fn active_serial(&self) -> Result<String> {
        self.navigator
            .active_serial()
            .map(str::to_string)
            .ok_or_else(|| EditorError::DeviceNotFound {
                serial: "<none>".to_string(),
            })
    }

    #[must_use]
    pub const fn active_page(&self) -> usize {
        self.navigator.active_page()
    }

    #[must_use]
    pub const fn selected_key(&self) -> usize {
        self.selected_key
    }

    #[must_use]
    pub fn grid(&self) -> &[GridSlot] {
        self.navigator.grid()
    }

    #[must_use]
    pub fn page_label(&self) -> String {
        self.navigator.page_label(&self.store)
    }

    // === Selection ===

    pub fn select_device(&mut self, serial: &str) -> Result<()> {
        self.navigator.switch_device(&mut self.store, serial)?;
        self.selected_key = 0;
        Ok(())
    }

    /// Select the key later edits apply to.
    pub fn select_key(&mut self, index: usize) -> Result<()> {
        let serial = self.active_serial()?;
        let count = self.store.key_count(&serial)?;
        if index >= count {
            return Err(EditorError::KeyOutOfRange {
                serial,
                index,
                count,
            });
        }
        self.selected_key = index;
        debug!(index, "Key selected");
        Ok(())
    }

    /// Select the application by its selector label (`Default` or a class).
    pub fn select_application(&mut self, label: &str) {
        self.navigator.select_application(context_for(label));
    }

    /// Context the selected key is edited under.
    #[must_use]
    pub fn current_context(&self) -> String {
        self.navigator.slot(self.selected_key).map_or_else(
            || self.navigator.selected_application().to_string(),
            |slot| slot.context.clone(),
        )
    }

    // === Pages ===

    pub fn next_page(&mut self) -> Result<bool> {
        self.navigator.next(&mut self.store)
    }

    pub fn previous_page(&mut self) -> Result<bool> {
        self.navigator.previous(&mut self.store)
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        self.navigator.go_to(&mut self.store, page)
    }

    /// Append a page and show it.
    pub fn add_page(&mut self) -> Result<usize> {
        let serial = self.active_serial()?;
        let page = self.store.add_page(&serial)?;
        self.navigator.go_to(&mut self.store, page)?;
        Ok(page)
    }

    /// Remove the shown page and show the one before it.
    ///
    /// If the daemon refuses to switch pages afterwards, the editor still
    /// moves to `next` so it never points past the last page.
    pub fn remove_page(&mut self) -> Result<usize> {
        let serial = self.active_serial()?;
        let next = self.store.remove_page(&serial, self.active_page())?;
        if let Err(err) = self.navigator.go_to(&mut self.store, next) {
            warn!(serial = %serial, page = next, error = %err, "Device did not follow the page removal");
            self.store.set_remembered_page(&serial, next)?;
            self.navigator.switch_device(&mut self.store, &serial)?;
            return Err(err);
        }
        Ok(next)
    }

    /// Empty the shown page.
    pub fn reset_page(&mut self) -> Result<()> {
        let serial = self.active_serial()?;
        self.store.reset(&serial, self.active_page())?;
        self.navigator.refresh_grid(&self.store)
    }

    /// Apply page changes reported by the daemon since the last call.
    pub fn process_events(&mut self) -> usize {
        self.navigator.drain_events(&mut self.store)
    }

    // === Key edits ===

    /// Config of the selected key under its context, creating it if missing.
    pub fn current_config(&mut self) -> Result<KeyConfig> {
        let serial = self.active_serial()?;
        let context = self.current_context();
        let page = self.active_page();
        let key = self.store.key_mut(&serial, page, self.selected_key)?;
        let resolved = resolve(key, &context);
        if resolved.created {
            debug!(context = %context, "Created override for display");
        }
        Ok(resolved.config.clone())
    }

    /// Run `edit` on the selected key's config under its context.
    ///
    /// The edit works on a copy; the store only changes when it succeeds.
    /// Pushes afterwards when live preview is on.
    pub fn edit_current<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut KeyConfig, &HandlerRegistry) -> Result<()>,
    {
        let serial = self.active_serial()?;
        let page = self.active_page();
        let index = self.selected_key;
        let context = self.current_context();

        let mut key = self.store.key(&serial, page, index)?;
        let resolved = resolve(&mut key, &context);
        edit(resolved.config, &self.registry)?;
        resolved.config.normalize_handlers();

        self.store.set_key(&serial, page, index, key.clone())?;
        self.navigator.record_edit(index, key);
        debug!(serial = %serial, page, index, context = %context, "Key edited");
        if self.live_preview {
            self.store.push()?;
        }
        Ok(())
    }

    /// Apply a built-in setting to the selected key.
    pub fn apply_builtin(&mut self, edit: &BuiltinEdit) -> Result<()> {
        self.edit_current(|config, _| edit.apply(config))
    }

    /// Choose the icon or key handler of the selected key.
    pub fn set_handler(&mut self, kind: HandlerKind, name: &str) -> Result<()> {
        self.edit_current(|config, registry| choose_handler(config, registry, kind, name))
    }

    /// Set a field of the selected key's chosen handler.
    pub fn set_handler_field(&mut self, kind: HandlerKind, field: &str, raw: &str) -> Result<()> {
        self.edit_current(|config, registry| set_handler_field(config, registry, kind, field, raw))
    }

    // === Clipboard ===

    /// Copy the selected key with all of its overrides.
    pub fn copy_key(&mut self) -> Result<()> {
        self.copy_key_at(self.active_page(), self.selected_key)
    }

    /// Copy a key of any page of the active device.
    ///
    /// Reads the working copy only; the device stays on its page.
    pub fn copy_key_at(&mut self, page: usize, index: usize) -> Result<()> {
        let serial = self.active_serial()?;
        let key = self.store.key(&serial, page, index)?;
        self.clipboard.copy(&key);
        Ok(())
    }

    /// Replace the selected key with the clipboard. Never pushes.
    pub fn paste_key(&mut self) -> Result<()> {
        let serial = self.active_serial()?;
        let page = self.active_page();
        let target = self.store.key(&serial, page, self.selected_key)?;
        let pasted: Key = self.clipboard.paste(&target);
        self.store.set_key(&serial, page, self.selected_key, pasted)?;
        self.navigator.refresh_grid(&self.store)
    }

    // === Daemon ===

    pub fn push(&self) -> Result<()> {
        self.store.push()
    }

    pub fn commit(&self) -> Result<()> {
        self.store.commit()
    }

    /// Discard local edits and show the daemon's saved config.
    pub fn reload(&mut self) -> Result<()> {
        self.store.reload_from_disk()?;
        let serial = self.active_serial()?;
        self.navigator.switch_device(&mut self.store, &serial)
    }

    /// Fire the action of a key on the active device.
    pub fn press(&self, index: usize) -> Result<()> {
        let serial = self.active_serial()?;
        let count = self.store.key_count(&serial)?;
        if index >= count {
            return Err(EditorError::KeyOutOfRange {
                serial,
                index,
                count,
            });
        }
        self.client.press_button(&serial, index)
    }

    /// Render the selected key's config through its handler.
    pub fn preview(&self) -> Result<DynamicImage> {
        let serial = self.active_serial()?;
        let key = self
            .store
            .key(&serial, self.active_page(), self.selected_key)?;
        let context = self.current_context();
        let config = key
            .config(&context)
            .or_else(|| key.config(DEFAULT_CONTEXT))
            .cloned()
            .unwrap_or_default();
        self.client.get_handler_preview(&serial, &config)
    }
}
