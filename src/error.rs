//! Error types for the deck layout editor.

use thiserror::Error;

/// Primary error type for editor operations.
#[derive(Error, Debug)]
pub enum EditorError {
    // Daemon errors
    #[error("Could not reach the deck daemon at {path}: {reason}")]
    DaemonUnavailable { path: String, reason: String },

    #[error("Daemon request '{method}' failed: {message}")]
    Daemon { method: String, message: String },

    #[error("Daemon protocol error: {0}")]
    Protocol(String),

    // Input validation errors
    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid brightness value {value}: must be 0-100")]
    InvalidBrightness { value: i64 },

    #[error("Invalid text alignment '{value}': expected TOP, MIDDLE or BOTTOM")]
    InvalidAlignment { value: String },

    #[error("Invalid value '{value}' for {field}: expected one of {allowed:?}")]
    InvalidSelection {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("File '{path}' does not match the accepted types {accepted:?}")]
    InvalidFileType { path: String, accepted: Vec<String> },

    // Structural lookup errors
    #[error("Handler not found: {name}")]
    HandlerNotFound { name: String },

    #[error("Handler '{name}' cannot be used as a {kind} handler")]
    HandlerIncapable { name: String, kind: String },

    #[error("Handler '{handler}' has no field named '{field}'")]
    FieldNotFound { handler: String, field: String },

    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    #[error("Page {page} out of range: deck {serial} has {count} pages")]
    PageOutOfRange {
        serial: String,
        page: usize,
        count: usize,
    },

    #[error("Key {index} out of range: device {serial} has {count} keys")]
    KeyOutOfRange {
        serial: String,
        index: usize,
        count: usize,
    },

    // External process errors
    #[error("Window list command failed: {0}")]
    WindowList(String),

    // Settings errors
    #[error("Settings error: {0}")]
    Settings(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl EditorError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DaemonUnavailable { .. }
                | Self::InvalidNumber { .. }
                | Self::InvalidBrightness { .. }
                | Self::InvalidAlignment { .. }
                | Self::InvalidSelection { .. }
                | Self::InvalidFileType { .. }
                | Self::DeviceNotFound { .. }
                | Self::PageOutOfRange { .. }
                | Self::KeyOutOfRange { .. }
                | Self::WindowList(_)
        )
    }

    /// Returns true for input validation failures rejected at the edit boundary.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidNumber { .. }
                | Self::InvalidBrightness { .. }
                | Self::InvalidAlignment { .. }
                | Self::InvalidSelection { .. }
                | Self::InvalidFileType { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DaemonUnavailable { .. } => {
                Some("Ensure the deck daemon is running, or pass --socket <PATH>")
            }
            Self::InvalidBrightness { .. } => Some("Use a value between 0 and 100"),
            Self::InvalidNumber { .. } => Some("Enter a whole number, or leave it empty"),
            Self::InvalidAlignment { .. } => Some("Use TOP, MIDDLE or BOTTOM"),
            Self::DeviceNotFound { .. } => Some("Run: sde devices"),
            Self::HandlerNotFound { .. } => Some("Run: sde handlers"),
            Self::WindowList(_) => Some("Install wmctrl or set window_list_command in the settings file"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using EditorError.
pub type Result<T> = std::result::Result<T, EditorError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| EditorError::Other(format!("{}: {e}", f().into())))
    }
}
