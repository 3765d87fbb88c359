//! Editor settings.
//!
//! Loaded from `$XDG_CONFIG_HOME/sde/config.{toml,yaml,yml}` when present;
//! a missing file means defaults. Command-line flags override file values.

mod path;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::apps::DEFAULT_WINDOW_LIST_COMMAND;
use crate::error::{EditorError, Result};
use crate::sync::default_socket_path;

pub use path::{APP_DIR, config_dir, expand_home, find_settings_file};

/// Default daemon round-trip timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Settings file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl SettingsFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Settings for one editor run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorSettings {
    /// Daemon socket; the runtime directory default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
    /// Read/write timeout for each daemon request. 0 disables it.
    pub request_timeout_ms: u64,
    /// Shell command listing open windows.
    pub window_list_command: String,
    /// Push the working copy after every edit.
    pub live_preview: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            window_list_command: DEFAULT_WINDOW_LIST_COMMAND.to_string(),
            live_preview: true,
        }
    }
}

impl EditorSettings {
    /// Load from `explicit`, or from the first settings file in the config
    /// directory. No file at the default location gives defaults.
    #[instrument]
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let dir = config_dir()?;
        match find_settings_file(&dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!(dir = %dir.display(), "No settings file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a settings file, choosing the format by extension.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let format = SettingsFormat::from_extension(path).ok_or_else(|| {
            EditorError::Settings(format!(
                "Unknown settings format for '{}': expected .toml, .yaml, or .yml",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EditorError::Settings(format!("Settings file not found: {}", path.display()))
            } else {
                EditorError::Io(e)
            }
        })?;
        let settings = Self::from_str_with(&content, format)?;
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Parse settings text in the given format.
    pub fn from_str_with(content: &str, format: SettingsFormat) -> Result<Self> {
        trace!(format = ?format, bytes = content.len(), "Parsing settings");
        let mut settings: Self = match format {
            SettingsFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| EditorError::Settings(format!("YAML: {e}")))?,
            SettingsFormat::Toml => {
                toml::from_str(content).map_err(|e| EditorError::Settings(format!("TOML: {e}")))?
            }
        };
        if let Some(socket) = settings.socket_path.take() {
            settings.socket_path = Some(expand_home(&socket)?);
        }
        Ok(settings)
    }

    /// Apply a command-line socket override.
    #[must_use]
    pub fn with_socket(mut self, socket: Option<PathBuf>) -> Self {
        if socket.is_some() {
            self.socket_path = socket;
        }
        self
    }

    /// Socket to connect to.
    pub fn socket_path(&self) -> Result<PathBuf> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => default_socket_path(),
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
