//! Locations of the editor settings file.
//!
//! Settings live under `$XDG_CONFIG_HOME/sde/`. Paths inside the file may
//! use `~` for the home directory.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{EditorError, Result};

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "sde";

/// File names searched in order.
const CANDIDATES: [&str; 3] = ["config.toml", "config.yaml", "config.yml"];

/// The editor's config directory.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| {
            EditorError::Settings("Could not determine the config directory".to_string())
        })
}

/// First existing settings file in `dir`, if any.
#[must_use]
pub fn find_settings_file(dir: &Path) -> Option<PathBuf> {
    let found = CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    trace!(dir = %dir.display(), found = ?found, "Searched for settings file");
    found
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let text = path.to_string_lossy();
    if text != "~" && !text.starts_with("~/") {
        return Ok(path.to_path_buf());
    }
    let home = dirs::home_dir().ok_or_else(|| {
        EditorError::Settings("Could not determine home directory".to_string())
    })?;
    let rest = text.strip_prefix("~/").unwrap_or("");
    let resolved = if rest.is_empty() { home } else { home.join(rest) };
    debug!(original = %path.display(), resolved = %resolved.display(), "Expanded home directory");
    Ok(resolved)
}
