//! Working copy of the daemon configuration.
//!
//! [`ConfigStore`] exclusively owns the [`Config`] tree for the session.
//! Other components borrow from it for a single operation at a time; a
//! reload replaces the tree wholesale.

use tracing::{debug, info, instrument, trace, warn};

use crate::config::{Config, Deck, Key, Page};
use crate::error::{EditorError, Result};
use crate::sanitize::sanitized;
use crate::sync::{DeviceInfo, SharedClient};

/// Owns the working configuration and the device descriptors.
pub struct ConfigStore {
    client: SharedClient,
    config: Config,
    devices: Vec<DeviceInfo>,
}

impl ConfigStore {
    /// Create a store with an empty working copy.
    #[must_use]
    pub fn new(client: SharedClient, devices: Vec<DeviceInfo>) -> Self {
        Self::with_config(client, devices, Config::new())
    }

    /// Create a store around an existing working copy.
    #[must_use]
    pub fn with_config(client: SharedClient, devices: Vec<DeviceInfo>, config: Config) -> Self {
        Self {
            client,
            config,
            devices,
        }
    }

    // === Session data ===

    /// Fetch the configuration from the daemon.
    ///
    /// On failure the working copy becomes an empty config and the error is
    /// returned for the caller to report; the session keeps running.
    #[instrument(skip(self))]
    pub fn load(&mut self) -> Result<()> {
        match self.client.get_config() {
            Ok(config) => {
                info!(decks = config.decks.len(), "Loaded configuration");
                self.config = config;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Falling back to an empty configuration");
                self.config = Config::new();
                Err(err)
            }
        }
    }

    /// Re-fetch the device list from the daemon.
    pub fn refresh_devices(&mut self) -> Result<()> {
        self.devices = self.client.get_devices()?;
        debug!(devices = self.devices.len(), "Refreshed devices");
        Ok(())
    }

    /// The working copy.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Known devices in daemon order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Descriptor of the device with this serial.
    pub fn device(&self, serial: &str) -> Result<&DeviceInfo> {
        self.devices
            .iter()
            .find(|d| d.serial == serial)
            .ok_or_else(|| EditorError::DeviceNotFound {
                serial: serial.to_string(),
            })
    }

    /// Keys per page on this device.
    pub fn key_count(&self, serial: &str) -> Result<usize> {
        Ok(self.device(serial)?.key_count())
    }

    /// Remember which page the device shows.
    pub fn set_remembered_page(&mut self, serial: &str, page: usize) -> Result<()> {
        let info = self
            .devices
            .iter_mut()
            .find(|d| d.serial == serial)
            .ok_or_else(|| EditorError::DeviceNotFound {
                serial: serial.to_string(),
            })?;
        trace!(serial, page, "Remembering device page");
        info.page = page;
        Ok(())
    }

    /// Number of pages in the device's deck.
    ///
    /// A device without a stored deck has one implicit empty page.
    #[must_use]
    pub fn page_count(&self, serial: &str) -> usize {
        self.config
            .deck(serial)
            .map_or(0, |deck| deck.pages.len())
            .max(1)
    }

    // === Reads ===

    /// Page `page` padded with empty keys to the device's grid size.
    pub fn page(&self, serial: &str, page: usize) -> Result<Page> {
        let key_count = self.key_count(serial)?;
        let count = self.page_count(serial);
        if page >= count {
            return Err(EditorError::PageOutOfRange {
                serial: serial.to_string(),
                page,
                count,
            });
        }
        let mut result = self
            .config
            .deck(serial)
            .and_then(|deck| deck.pages.get(page))
            .cloned()
            .unwrap_or_default();
        result.ensure_length(key_count);
        Ok(result)
    }

    /// The page the device currently shows, padded to the grid size.
    ///
    /// An index past the stored pages yields an all-empty page.
    pub fn current_page(&self, serial: &str) -> Result<Page> {
        let info = self.device(serial)?;
        let key_count = info.key_count();
        let index = info.page;
        match self.page(serial, index) {
            Ok(page) => Ok(page),
            Err(EditorError::PageOutOfRange { count, .. }) => {
                debug!(serial, index, count, "Current page not stored yet");
                Ok(Page::empty(key_count))
            }
            Err(other) => Err(other),
        }
    }

    /// Copy of the key at a position; unstored keys inside the grid are empty.
    pub fn key(&self, serial: &str, page: usize, index: usize) -> Result<Key> {
        self.check_key_index(serial, index)?;
        Ok(self.page(serial, page)?.key_or_empty(index))
    }

    // === Writes ===

    /// The deck for `serial`, created with one empty page if missing.
    pub fn ensure_deck(&mut self, serial: &str) -> Result<&mut Deck> {
        let key_count = self.key_count(serial)?;
        Ok(deck_in(&mut self.config, serial, key_count))
    }

    /// Mutable key at a position, growing the page up to the grid size.
    ///
    /// Positions outside the grid or past the last page are errors and
    /// leave the tree unchanged.
    pub fn key_mut(&mut self, serial: &str, page: usize, index: usize) -> Result<&mut Key> {
        self.check_key_index(serial, index)?;
        self.check_page_index(serial, page)?;
        let key_count = self.key_count(serial)?;
        let deck = self.ensure_deck(serial)?;
        let stored = &mut deck.pages[page];
        stored.ensure_length(key_count);
        Ok(&mut stored.keys[index])
    }

    /// Replace the key at a position.
    ///
    /// Out-of-range positions return an error and change nothing; this
    /// guards edits racing with page navigation.
    pub fn set_key(&mut self, serial: &str, page: usize, index: usize, key: Key) -> Result<()> {
        match self.key_mut(serial, page, index) {
            Ok(slot) => {
                trace!(serial, page, index, "Replacing key");
                *slot = key;
                Ok(())
            }
            Err(err) => {
                debug!(serial, page, index, error = %err, "Ignoring out-of-range key write");
                Err(err)
            }
        }
    }

    /// Empty every key of a page and push. Does not commit.
    ///
    /// If the push fails the working copy is left as it was.
    #[instrument(skip(self))]
    pub fn reset(&mut self, serial: &str, page: usize) -> Result<()> {
        self.check_page_index(serial, page)?;
        self.push_page_edit(serial, |pages, key_count| {
            pages[page] = Page::empty(key_count);
        })?;
        info!(serial, page, "Page reset");
        Ok(())
    }

    /// Append an empty page and push. Returns the new page's index.
    #[instrument(skip(self))]
    pub fn add_page(&mut self, serial: &str) -> Result<usize> {
        let index = self.push_page_edit(serial, |pages, key_count| {
            pages.push(Page::empty(key_count));
            pages.len() - 1
        })?;
        info!(serial, index, "Page added");
        Ok(index)
    }

    /// Remove a page and push. Returns the page to show afterwards.
    ///
    /// Removing a deck's only page resets it instead.
    #[instrument(skip(self))]
    pub fn remove_page(&mut self, serial: &str, page: usize) -> Result<usize> {
        self.check_page_index(serial, page)?;
        if self.page_count(serial) == 1 {
            debug!(serial, "Removing the only page resets it");
            self.reset(serial, page)?;
            return Ok(0);
        }
        let remaining = self.push_page_edit(serial, |pages, _| {
            pages.remove(page);
            pages.len()
        })?;
        info!(serial, page, remaining, "Page removed");
        Ok(page.saturating_sub(1))
    }

    /// Run `edit` on a copy of the deck's pages and push that copy.
    ///
    /// The copy replaces the working copy only once the daemon took it.
    fn push_page_edit<T>(
        &mut self,
        serial: &str,
        edit: impl FnOnce(&mut Vec<Page>, usize) -> T,
    ) -> Result<T> {
        let key_count = self.key_count(serial)?;
        let mut staged = self.config.clone();
        let outcome = edit(&mut deck_in(&mut staged, serial, key_count).pages, key_count);
        if let Err(err) = self.client.set_config(&sanitized(&staged)) {
            warn!(serial, error = %err, "Push failed; page change discarded");
            return Err(err);
        }
        debug!("Pushed working copy");
        self.config = staged;
        Ok(outcome)
    }

    // === Daemon sync ===

    /// Send the sanitized working copy as a live preview.
    #[instrument(skip(self))]
    pub fn push(&self) -> Result<()> {
        self.client.set_config(&sanitized(&self.config))?;
        debug!("Pushed working copy");
        Ok(())
    }

    /// Push, then have the daemon persist. No persist if the push fails.
    #[instrument(skip(self))]
    pub fn commit(&self) -> Result<()> {
        self.push()?;
        self.client.commit_config()?;
        info!("Configuration committed");
        Ok(())
    }

    /// Have the daemon re-read its file, then replace the working copy.
    ///
    /// Unsaved edits are discarded. On any failure the working copy stays.
    #[instrument(skip(self))]
    pub fn reload_from_disk(&mut self) -> Result<()> {
        self.client.reload_config()?;
        let config = self.client.get_config()?;
        info!(decks = config.decks.len(), "Reloaded configuration from disk");
        self.config = config;
        Ok(())
    }

    fn check_page_index(&self, serial: &str, page: usize) -> Result<()> {
        let count = self.page_count(serial);
        if page >= count {
            return Err(EditorError::PageOutOfRange {
                serial: serial.to_string(),
                page,
                count,
            });
        }
        Ok(())
    }

    fn check_key_index(&self, serial: &str, index: usize) -> Result<()> {
        let count = self.key_count(serial)?;
        if index >= count {
            return Err(EditorError::KeyOutOfRange {
                serial: serial.to_string(),
                index,
                count,
            });
        }
        Ok(())
    }
}

/// The deck for `serial` inside `config`, created with one empty page if missing.
fn deck_in<'a>(config: &'a mut Config, serial: &str, key_count: usize) -> &'a mut Deck {
    let position = match config.decks.iter().position(|d| d.serial == serial) {
        Some(position) => position,
        None => {
            info!(serial, "Creating deck for device");
            config.decks.push(Deck::new(serial, key_count));
            config.decks.len() - 1
        }
    };
    let deck = &mut config.decks[position];
    if deck.pages.is_empty() {
        deck.pages.push(Page::empty(key_count));
    }
    deck
}
