//! Page navigation state machine.
//!
//! Tracks which device and page the editor shows and keeps one grid of key
//! slots per device. Local moves tell the daemon first; page changes
//! reported by the daemon are queued by the listener thread and applied by
//! [`PageNavigator::drain_events`] on the owning thread, without telling
//! the daemon again.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{DEFAULT_CONTEXT, Key};
use crate::error::{EditorError, Result};
use crate::resolver::context_after_refresh;
use crate::store::ConfigStore;
use crate::sync::{PageEvent, PageListener, SharedClient};

/// One button position of the displayed grid.
///
/// Holds the position, the application context being edited there, and the
/// key as last shown. Current data always comes from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSlot {
    pub index: usize,
    pub context: String,
    pub key: Key,
}

/// Where a refresh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    /// The user moved; the daemon is told to show the page.
    Local,
    /// The daemon moved; nothing is sent back.
    Remote,
}

/// Active device and page, plus the per-device grids.
pub struct PageNavigator {
    client: SharedClient,
    active_serial: Option<String>,
    active_page: usize,
    selected_application: String,
    grids: HashMap<String, Vec<GridSlot>>,
    events_tx: UnboundedSender<PageEvent>,
    events_rx: UnboundedReceiver<PageEvent>,
}

impl PageNavigator {
    #[must_use]
    pub fn new(client: SharedClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            client,
            active_serial: None,
            active_page: 0,
            selected_application: DEFAULT_CONTEXT.to_string(),
            grids: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// Listener for [`SyncClient::register_page_listener`](crate::sync::SyncClient::register_page_listener).
    ///
    /// It only enqueues; events take effect on the next [`Self::drain_events`].
    #[must_use]
    pub fn listener(&self) -> PageListener {
        let tx = self.events_tx.clone();
        Box::new(move |event: PageEvent| {
            trace!(serial = %event.serial, page = event.page, "Queueing page event");
            if tx.send(event).is_err() {
                debug!("Navigator dropped; page event discarded");
            }
        })
    }

    // === State ===

    #[must_use]
    pub fn active_serial(&self) -> Option<&str> {
        self.active_serial.as_deref()
    }

    #[must_use]
    pub const fn active_page(&self) -> usize {
        self.active_page
    }

    /// Application context new edits go to.
    #[must_use]
    pub fn selected_application(&self) -> &str {
        &self.selected_application
    }

    /// Grid of the active device.
    #[must_use]
    pub fn grid(&self) -> &[GridSlot] {
        self.active_serial
            .as_ref()
            .and_then(|serial| self.grids.get(serial))
            .map_or(&[], Vec::as_slice)
    }

    /// Grid kept for any device, shown or hidden.
    #[must_use]
    pub fn grid_for(&self, serial: &str) -> Option<&[GridSlot]> {
        self.grids.get(serial).map(Vec::as_slice)
    }

    /// Slot at `index` of the active grid.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&GridSlot> {
        self.grid().get(index)
    }

    /// `"{page+1}/{count}"` for the active device.
    #[must_use]
    pub fn page_label(&self, store: &ConfigStore) -> String {
        match &self.active_serial {
            Some(serial) => format!("{}/{}", self.active_page + 1, store.page_count(serial)),
            None => "0/0".to_string(),
        }
    }

    fn require_active(&self) -> Result<String> {
        self.active_serial
            .clone()
            .ok_or_else(|| EditorError::Other("No device selected".to_string()))
    }

    // === Device switch ===

    /// Make `serial` the active device at its remembered page.
    ///
    /// The previous device's grid is kept as it was.
    #[instrument(skip(self, store))]
    pub fn switch_device(&mut self, store: &mut ConfigStore, serial: &str) -> Result<()> {
        let remembered = store.device(serial)?.page;
        let last = store.page_count(serial) - 1;
        let page = if remembered > last {
            warn!(serial, remembered, last, "Remembered page no longer exists; clamping");
            last
        } else {
            remembered
        };
        store.set_remembered_page(serial, page)?;
        self.active_serial = Some(serial.to_string());
        self.active_page = page;
        info!(serial, page, "Active device switched");
        self.refresh_grid(store)
    }

    // === Local moves ===

    /// Show `page` on the active device.
    ///
    /// The daemon is told first; if that fails nothing changes locally.
    #[instrument(skip(self, store))]
    pub fn go_to(&mut self, store: &mut ConfigStore, page: usize) -> Result<()> {
        let serial = self.require_active()?;
        let count = store.page_count(&serial);
        if page >= count {
            return Err(EditorError::PageOutOfRange {
                serial,
                page,
                count,
            });
        }
        self.client.set_page(&serial, page)?;
        self.apply_page(store, &serial, page, PageChange::Local)
    }

    /// Move one page forward. Stays on the last page; returns whether it moved.
    pub fn next(&mut self, store: &mut ConfigStore) -> Result<bool> {
        let serial = self.require_active()?;
        if self.active_page + 1 >= store.page_count(&serial) {
            debug!(page = self.active_page, "Already on the last page");
            return Ok(false);
        }
        self.go_to(store, self.active_page + 1)?;
        Ok(true)
    }

    /// Move one page back. Stays on the first page; returns whether it moved.
    pub fn previous(&mut self, store: &mut ConfigStore) -> Result<bool> {
        self.require_active()?;
        if self.active_page == 0 {
            debug!("Already on the first page");
            return Ok(false);
        }
        self.go_to(store, self.active_page - 1)?;
        Ok(true)
    }

    // === Remote moves ===

    /// Apply one daemon-reported page change. Returns whether the visible
    /// grid was refreshed.
    ///
    /// Never calls `set_page`.
    #[instrument(skip(self, store), fields(serial = %event.serial, page = event.page))]
    pub fn handle_event(&mut self, store: &mut ConfigStore, event: &PageEvent) -> Result<bool> {
        if self.active_serial.as_deref() != Some(event.serial.as_str()) {
            store.set_remembered_page(&event.serial, event.page)?;
            debug!("Remembered page for inactive device");
            return Ok(false);
        }

        let last = store.page_count(&event.serial) - 1;
        let page = if event.page > last {
            warn!(last, "Daemon reported a page not in the working copy; clamping");
            last
        } else {
            event.page
        };
        if page == self.active_page {
            trace!("Already showing page");
            return Ok(false);
        }
        self.apply_page(store, &event.serial, page, PageChange::Remote)?;
        Ok(true)
    }

    /// Apply every queued page event. Returns how many refreshed the grid.
    ///
    /// Events for unknown devices are logged and skipped.
    pub fn drain_events(&mut self, store: &mut ConfigStore) -> usize {
        let mut refreshed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            match self.handle_event(store, &event) {
                Ok(true) => refreshed += 1,
                Ok(false) => {}
                Err(err) => warn!(serial = %event.serial, error = %err, "Skipping page event"),
            }
        }
        refreshed
    }

    fn apply_page(
        &mut self,
        store: &mut ConfigStore,
        serial: &str,
        page: usize,
        change: PageChange,
    ) -> Result<()> {
        store.set_remembered_page(serial, page)?;
        self.active_page = page;
        debug!(serial, page, ?change, "Page changed");
        self.refresh_grid(store)
    }

    // === Grid ===

    /// Rebuild the active grid from the store.
    ///
    /// Slots whose key kept its identity keep their context; changed keys
    /// fall back to the default context. Running it twice is a no-op.
    pub fn refresh_grid(&mut self, store: &ConfigStore) -> Result<()> {
        let serial = self.require_active()?;
        let page = store.page(&serial, self.active_page)?;
        let previous = self.grids.remove(&serial).unwrap_or_default();

        let grid: Vec<GridSlot> = page
            .keys
            .into_iter()
            .enumerate()
            .map(|(index, key)| {
                let context = previous.get(index).map_or(DEFAULT_CONTEXT, |slot| {
                    context_after_refresh(&slot.key, &key, &slot.context)
                });
                GridSlot {
                    index,
                    context: context.to_string(),
                    key,
                }
            })
            .collect();
        trace!(serial = %serial, slots = grid.len(), "Grid refreshed");
        self.grids.insert(serial, grid);
        Ok(())
    }

    /// Record the key now stored at `index` after a local edit.
    ///
    /// Keeps the slot's context; an edit is not a change of identity.
    pub fn record_edit(&mut self, index: usize, key: Key) {
        let Some(serial) = self.active_serial.clone() else {
            return;
        };
        if let Some(slot) = self.grids.get_mut(&serial).and_then(|g| g.get_mut(index)) {
            slot.key = key;
        }
    }

    /// Select the application context for editing and re-resolve every slot.
    pub fn select_application(&mut self, context: &str) {
        info!(context, "Selected application");
        self.selected_application = context.to_string();
        for slot in self.grids.values_mut().flatten() {
            slot.context = context.to_string();
        }
    }
}
