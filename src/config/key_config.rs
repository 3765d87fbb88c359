//! Per-application key configuration.
//!
//! A [`KeyConfig`] is the editable leaf of the configuration tree: what a key
//! shows (icon, text, or a handler-rendered image) and what it does when
//! pressed (built-in actions or a handler plugin).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{trace, warn};

use crate::error::{EditorError, Result};

/// Handler name the UI shows for the built-in behavior.
pub const DEFAULT_HANDLER: &str = "Default";

/// Vertical placement of key text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextAlignment {
    Top,
    Middle,
    Bottom,
}

impl TextAlignment {
    /// All alignments in display order.
    pub const ALL: [Self; 3] = [Self::Top, Self::Middle, Self::Bottom];

    /// Upper-case label used on the wire and in selectors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Middle => "MIDDLE",
            Self::Bottom => "BOTTOM",
        }
    }
}

impl fmt::Display for TextAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextAlignment {
    type Err = EditorError;

    /// Parses case-insensitively, so stored lower-case values still select.
    fn from_str(s: &str) -> Result<Self> {
        trace!(value = %s, "Parsing text alignment");
        match s.trim().to_uppercase().as_str() {
            "TOP" => Ok(Self::Top),
            "MIDDLE" => Ok(Self::Middle),
            "BOTTOM" => Ok(Self::Bottom),
            _ => Err(EditorError::InvalidAlignment {
                value: s.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for TextAlignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Stored alignment; blank or unrecognized values read as unset.
fn lenient_alignment<'de, D>(deserializer: D) -> std::result::Result<Option<TextAlignment>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match raw.parse() {
        Ok(alignment) => Ok(Some(alignment)),
        Err(err) => {
            warn!(error = %err, "Ignoring stored text alignment");
            Ok(None)
        }
    }
}

/// Configuration of one key under one application context.
///
/// Every field defaults to its empty value and is omitted from the wire
/// format when empty, so an untouched config serializes as `{}`. Wire
/// names are camelCase (`iconHandler`, `textSize`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyConfig {
    /// Path to an icon image file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,

    /// Icon handler plugin name; `""` is the built-in renderer.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_handler: String,

    /// Plugin-specific icon parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub icon_handler_fields: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Font size, 0 means the daemon's default.
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub text_size: u32,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_alignment"
    )]
    pub text_alignment: Option<TextAlignment>,

    /// Key handler plugin name; `""` is the built-in action set.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_handler: String,

    /// Plugin-specific key parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub key_handler_fields: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Target page index, 0 leaves it unset.
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub switch_page: u32,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub keybind: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,

    /// Device brightness to apply when pressed (0-100), 0 leaves it unchanged.
    #[serde(skip_serializing_if = "is_zero_u8")]
    pub brightness: u8,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
const fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
const fn is_zero_u8(value: &u8) -> bool {
    *value == 0
}

impl KeyConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every field holds its default value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Icon handler name as shown in selectors (`Default` for built-in).
    #[must_use]
    pub fn icon_handler_label(&self) -> &str {
        handler_label(&self.icon_handler)
    }

    /// Key handler name as shown in selectors (`Default` for built-in).
    #[must_use]
    pub fn key_handler_label(&self) -> &str {
        handler_label(&self.key_handler)
    }

    /// True if the icon is produced by the built-in renderer.
    #[must_use]
    pub fn uses_builtin_icon(&self) -> bool {
        is_builtin_handler(&self.icon_handler)
    }

    /// True if presses are handled by the built-in action set.
    #[must_use]
    pub fn uses_builtin_key(&self) -> bool {
        is_builtin_handler(&self.key_handler)
    }

    /// Rewrite `Default` handler names to the canonical empty form.
    pub fn normalize_handlers(&mut self) {
        if self.icon_handler == DEFAULT_HANDLER {
            trace!("Normalizing icon handler Default -> \"\"");
            self.icon_handler.clear();
        }
        if self.key_handler == DEFAULT_HANDLER {
            trace!("Normalizing key handler Default -> \"\"");
            self.key_handler.clear();
        }
    }
}

/// True for both spellings of the built-in handler.
#[must_use]
pub fn is_builtin_handler(name: &str) -> bool {
    name.is_empty() || name == DEFAULT_HANDLER
}

fn handler_label(name: &str) -> &str {
    if name.is_empty() { DEFAULT_HANDLER } else { name }
}
