//! Daemon boundary.
//!
//! The daemon owns the persisted configuration and the hardware. This module
//! defines the [`SyncClient`] trait the editor core talks to, a Unix socket
//! implementation, and a recording mock for tests.

mod info;
pub mod mock;
pub mod protocol;
mod socket;

pub use info::{DeviceInfo, PageEvent};
pub use socket::{SocketClient, default_socket_path};

use image::DynamicImage;

use crate::config::{Config, KeyConfig, Module};
use crate::error::Result;

/// Callback invoked on the listener thread for every page change.
pub type PageListener = Box<dyn Fn(PageEvent) + Send + 'static>;

/// Operations the editor needs from the deck daemon.
///
/// Every call is a blocking round trip. Implementations bound each call with
/// a timeout rather than waiting forever.
///
/// # Implementation Notes
///
/// - `set_config` is a live preview: the device shows it, nothing is saved
/// - `commit_config` persists whatever the daemon currently holds
/// - `register_page_listener` returns once subscribed; events arrive later on
///   a thread owned by the implementation
pub trait SyncClient: Send + Sync {
    /// Fetch the daemon's current configuration.
    fn get_config(&self) -> Result<Config>;

    /// Replace the daemon's in-memory configuration without saving it.
    fn set_config(&self, config: &Config) -> Result<()>;

    /// Persist the daemon's in-memory configuration to disk.
    fn commit_config(&self) -> Result<()>;

    /// Make the daemon re-read its configuration file.
    fn reload_config(&self) -> Result<()>;

    /// Show `page` on the device with this serial.
    fn set_page(&self, serial: &str, page: usize) -> Result<()>;

    /// Subscribe to device-originated page changes.
    fn register_page_listener(&self, listener: PageListener) -> Result<()>;

    /// Trigger the action bound to a key, as if it was pressed.
    fn press_button(&self, serial: &str, key_index: usize) -> Result<()>;

    /// Handler modules installed in the daemon.
    fn get_modules(&self) -> Result<Vec<Module>>;

    /// Devices currently managed by the daemon.
    fn get_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Render `config` with its icon handler for a preview.
    fn get_handler_preview(&self, serial: &str, config: &KeyConfig) -> Result<DynamicImage>;
}

/// Shared handle to a client, passed to every component that needs one.
pub type SharedClient = std::sync::Arc<dyn SyncClient>;
