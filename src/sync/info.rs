//! Device descriptors and page events reported by the daemon.

use serde::{Deserialize, Serialize};

/// Information about a device managed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceInfo {
    /// Device serial number
    pub serial: String,
    /// Human-readable product name
    #[serde(default)]
    pub name: String,
    /// Number of key columns
    pub cols: usize,
    /// Number of key rows
    pub rows: usize,
    /// Page currently displayed on the device
    #[serde(default)]
    pub page: usize,
    /// Edge length of key images in pixels
    #[serde(default)]
    pub icon_size: u32,
}

impl DeviceInfo {
    /// Number of keys on one page.
    #[must_use]
    pub const fn key_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Row-major grid position of a key index.
    #[must_use]
    pub const fn position(&self, index: usize) -> Option<(usize, usize)> {
        if self.cols == 0 || index >= self.key_count() {
            return None;
        }
        Some((index / self.cols, index % self.cols))
    }
}

/// The daemon reports that a device now shows another page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageEvent {
    pub serial: String,
    pub page: usize,
}
