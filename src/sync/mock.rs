//! Mock daemon for unit testing.
//!
//! Holds an in-memory "live" and "persisted" configuration, records every
//! call, and lets tests inject failures or emit page-change events from any
//! thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use sde::sync::mock::{MockDaemon, Operation};
//! use sde::sync::SyncClient;
//!
//! let daemon = MockDaemon::single_device("AL12", 3, 2);
//! daemon.set_page("AL12", 1).unwrap();
//! daemon.assert_operations(&[Operation::SetPage { serial: "AL12".into(), page: 1 }]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, trace};

use super::{DeviceInfo, PageEvent, PageListener, SyncClient};
use crate::config::{Config, Deck, KeyConfig, Module};
use crate::error::{EditorError, Result};

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetConfig,
    SetConfig,
    CommitConfig,
    ReloadConfig,
    SetPage { serial: String, page: usize },
    RegisterPageListener,
    PressButton { serial: String, key_index: usize },
    GetModules,
    GetDevices,
    GetHandlerPreview { serial: String },
}

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Fail after N operations (for testing error recovery).
    pub fail_after_ops: Option<usize>,
    /// Method names that always fail, e.g. `"commit_config"`.
    pub failing_methods: Vec<&'static str>,
    /// Initial connection state.
    pub connected: bool,
}

impl MockConfig {
    /// Create a connected mock configuration.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }
}

/// Mock daemon for testing without a running daemon process.
pub struct MockDaemon {
    devices: Mutex<Vec<DeviceInfo>>,
    modules: Vec<Module>,
    live: Mutex<Config>,
    persisted: Mutex<Config>,
    listeners: Mutex<Vec<PageListener>>,
    operation_log: Mutex<Vec<Operation>>,
    error_injection: Mutex<Option<EditorError>>,
    config: MockConfig,
    connected: AtomicBool,
}

impl MockDaemon {
    /// Create a mock managing `devices` with `config` as both live and persisted state.
    #[must_use]
    pub fn new(devices: Vec<DeviceInfo>, config: Config) -> Self {
        debug!(devices = devices.len(), "Creating mock daemon");
        Self {
            devices: Mutex::new(devices),
            modules: Vec::new(),
            live: Mutex::new(config.clone()),
            persisted: Mutex::new(config),
            listeners: Mutex::new(Vec::new()),
            operation_log: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
            config: MockConfig::connected(),
            connected: AtomicBool::new(true),
        }
    }

    /// One device with a single empty page.
    #[must_use]
    pub fn single_device(serial: &str, cols: usize, rows: usize) -> Self {
        let info = device(serial, cols, rows);
        let config = Config {
            decks: vec![Deck::new(serial, info.key_count())],
        };
        Self::new(vec![info], config)
    }

    // === Configuration ===

    /// Configure mock behavior.
    #[must_use]
    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.connected.store(config.connected, Ordering::SeqCst);
        self.config = config;
        self
    }

    /// Handler modules reported by `get_modules`.
    #[must_use]
    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    /// Inject an error for the next operation.
    pub fn inject_error(&self, error: EditorError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Set daemon as unreachable.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Set daemon as reachable.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    // === Daemon-side simulation ===

    /// Simulate the device switching page on its own and notify listeners.
    ///
    /// Listeners run on the calling thread, like the real listener thread.
    pub fn emit_page_change(&self, serial: &str, page: usize) {
        if let Some(info) = self
            .devices
            .lock()
            .unwrap()
            .iter_mut()
            .find(|d| d.serial == serial)
        {
            info.page = page;
        }
        let listeners = self.listeners.lock().unwrap();
        trace!(serial, page, listeners = listeners.len(), "Emitting page change");
        for listener in listeners.iter() {
            listener(PageEvent {
                serial: serial.to_string(),
                page,
            });
        }
    }

    /// Replace the persisted configuration, as if edited by another client.
    pub fn set_persisted(&self, config: Config) {
        *self.persisted.lock().unwrap() = config;
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_log.lock().unwrap().len()
    }

    /// Count recorded operations matching a predicate.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Operation) -> bool) -> usize {
        self.operation_log
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(op))
            .count()
    }

    /// Assert specific operations were performed.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert no `set_page` call was made.
    ///
    /// # Panics
    ///
    /// Panics if any `SetPage` operation was recorded.
    pub fn assert_no_set_page(&self) {
        let ops = self.operations();
        assert!(
            !ops.iter().any(|op| matches!(op, Operation::SetPage { .. })),
            "Expected no set_page, but found: {ops:#?}",
        );
    }

    /// The daemon's live (previewed) configuration.
    #[must_use]
    pub fn live_config(&self) -> Config {
        self.live.lock().unwrap().clone()
    }

    /// The daemon's persisted configuration.
    #[must_use]
    pub fn persisted_config(&self) -> Config {
        self.persisted.lock().unwrap().clone()
    }

    /// Page the device currently displays.
    #[must_use]
    pub fn device_page(&self, serial: &str) -> Option<usize> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.serial == serial)
            .map(|d| d.page)
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    /// Record the call, then decide whether it fails.
    fn begin(&self, op: Operation, method: &str) -> Result<()> {
        trace!(?op, "Recording operation");
        let count = {
            let mut log = self.operation_log.lock().unwrap();
            log.push(op);
            log.len()
        };

        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(EditorError::DaemonUnavailable {
                path: "mock".to_string(),
                reason: "Mock daemon disconnected".to_string(),
            });
        }
        if self.config.failing_methods.contains(&method) {
            return Err(EditorError::Daemon {
                method: method.to_string(),
                message: "Mock method configured to fail".to_string(),
            });
        }
        if let Some(limit) = self.config.fail_after_ops {
            if count > limit {
                return Err(EditorError::Daemon {
                    method: method.to_string(),
                    message: "Mock failure after ops limit".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl SyncClient for MockDaemon {
    fn get_config(&self) -> Result<Config> {
        self.begin(Operation::GetConfig, "get_config")?;
        Ok(self.live.lock().unwrap().clone())
    }

    fn set_config(&self, config: &Config) -> Result<()> {
        self.begin(Operation::SetConfig, "set_config")?;
        *self.live.lock().unwrap() = config.clone();
        Ok(())
    }

    fn commit_config(&self) -> Result<()> {
        self.begin(Operation::CommitConfig, "commit_config")?;
        let live = self.live.lock().unwrap().clone();
        *self.persisted.lock().unwrap() = live;
        Ok(())
    }

    fn reload_config(&self) -> Result<()> {
        self.begin(Operation::ReloadConfig, "reload_config")?;
        let persisted = self.persisted.lock().unwrap().clone();
        *self.live.lock().unwrap() = persisted;
        Ok(())
    }

    fn set_page(&self, serial: &str, page: usize) -> Result<()> {
        self.begin(
            Operation::SetPage {
                serial: serial.to_string(),
                page,
            },
            "set_page",
        )?;
        let mut devices = self.devices.lock().unwrap();
        let info = devices
            .iter_mut()
            .find(|d| d.serial == serial)
            .ok_or_else(|| EditorError::DeviceNotFound {
                serial: serial.to_string(),
            })?;
        info.page = page;
        Ok(())
    }

    fn register_page_listener(&self, listener: PageListener) -> Result<()> {
        self.begin(Operation::RegisterPageListener, "subscribe_pages")?;
        self.listeners.lock().unwrap().push(listener);
        Ok(())
    }

    fn press_button(&self, serial: &str, key_index: usize) -> Result<()> {
        self.begin(
            Operation::PressButton {
                serial: serial.to_string(),
                key_index,
            },
            "press_button",
        )
    }

    fn get_modules(&self) -> Result<Vec<Module>> {
        self.begin(Operation::GetModules, "get_modules")?;
        Ok(self.modules.clone())
    }

    fn get_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.begin(Operation::GetDevices, "get_devices")?;
        Ok(self.devices.lock().unwrap().clone())
    }

    fn get_handler_preview(&self, serial: &str, config: &KeyConfig) -> Result<DynamicImage> {
        self.begin(
            Operation::GetHandlerPreview {
                serial: serial.to_string(),
            },
            "get_handler_preview",
        )?;
        let size = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.serial == serial)
            .map_or(72, |d| d.icon_size.max(1));
        // Shade encodes the handler name length so tests can tell previews apart.
        let shade = u8::try_from(config.icon_handler.len().min(255)).unwrap_or(u8::MAX);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            size,
            size,
            Rgba([shade, shade, shade, 255]),
        )))
    }
}

/// Device descriptor for tests.
#[must_use]
pub fn device(serial: &str, cols: usize, rows: usize) -> DeviceInfo {
    DeviceInfo {
        serial: serial.to_string(),
        name: format!("Mock {cols}x{rows}"),
        cols,
        rows,
        page: 0,
        icon_size: 72,
    }
}

/// Create a thread-safe mock wrapped in an `Arc`.
///
/// Useful for tests that share the mock with a session.
#[must_use]
pub fn arc_mock(serial: &str, cols: usize, rows: usize) -> Arc<MockDaemon> {
    Arc::new(MockDaemon::single_device(serial, cols, rows))
}
