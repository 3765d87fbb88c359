//! Validated edits applied to a [`KeyConfig`].
//!
//! Raw user input arrives as strings. Each edit is parsed and checked
//! before anything is written, so a rejected value leaves the previous one
//! in place.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Field, FieldKind, HandlerKind, KeyConfig, TextAlignment};
use crate::error::{EditorError, Result};
use crate::handlers::HandlerRegistry;

/// File types accepted for the built-in icon.
pub const ICON_FILE_TYPES: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Highest brightness the daemon accepts.
pub const MAX_BRIGHTNESS: i64 = 100;

/// An edit of one built-in `Default` handler setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinEdit {
    Text(String),
    TextSize(String),
    TextAlignment(String),
    /// Icon path; empty clears it.
    Icon(String),
    Url(String),
    SwitchPage(String),
    Keybind(String),
    Command(String),
    Brightness(String),
}

impl BuiltinEdit {
    /// Setting names accepted by [`Self::parse`].
    pub const NAMES: [&'static str; 9] = [
        "text",
        "text_size",
        "text_alignment",
        "icon",
        "url",
        "switch_page",
        "keybind",
        "command",
        "brightness",
    ];

    /// Build an edit from a setting name and raw value.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let value = value.to_string();
        Ok(match name {
            "text" => Self::Text(value),
            "text_size" => Self::TextSize(value),
            "text_alignment" => Self::TextAlignment(value),
            "icon" => Self::Icon(value),
            "url" => Self::Url(value),
            "switch_page" => Self::SwitchPage(value),
            "keybind" => Self::Keybind(value),
            "command" => Self::Command(value),
            "brightness" => Self::Brightness(value),
            other => {
                return Err(EditorError::FieldNotFound {
                    handler: crate::config::DEFAULT_HANDLER.to_string(),
                    field: other.to_string(),
                });
            }
        })
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::TextSize(_) => "text_size",
            Self::TextAlignment(_) => "text_alignment",
            Self::Icon(_) => "icon",
            Self::Url(_) => "url",
            Self::SwitchPage(_) => "switch_page",
            Self::Keybind(_) => "keybind",
            Self::Command(_) => "command",
            Self::Brightness(_) => "brightness",
        }
    }

    /// Whether this belongs to the icon or the key side.
    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        match self {
            Self::Text(_) | Self::TextSize(_) | Self::TextAlignment(_) | Self::Icon(_) => {
                HandlerKind::Icon
            }
            Self::Url(_)
            | Self::SwitchPage(_)
            | Self::Keybind(_)
            | Self::Command(_)
            | Self::Brightness(_) => HandlerKind::Key,
        }
    }

    /// Validate and write into `config`. On error `config` is untouched.
    pub fn apply(&self, config: &mut KeyConfig) -> Result<()> {
        match self {
            Self::Text(text) => config.text.clone_from(text),
            Self::TextSize(raw) => config.text_size = parse_number("text_size", raw)?,
            Self::TextAlignment(raw) => {
                config.text_alignment = if raw.trim().is_empty() {
                    None
                } else {
                    Some(TextAlignment::from_str(raw)?)
                };
            }
            Self::Icon(path) => {
                if !path.is_empty() {
                    check_file_type(path, ICON_FILE_TYPES.as_slice())?;
                }
                config.icon.clone_from(path);
            }
            Self::Url(url) => config.url.clone_from(url),
            Self::SwitchPage(raw) => config.switch_page = parse_number("switch_page", raw)?,
            Self::Keybind(keybind) => config.keybind.clone_from(keybind),
            Self::Command(command) => config.command.clone_from(command),
            Self::Brightness(raw) => config.brightness = parse_brightness(raw)?,
        }
        debug!(setting = self.name(), "Applied built-in edit");
        Ok(())
    }
}

/// Parse a whole number; empty input means zero.
fn parse_number<T>(field: &str, raw: &str) -> Result<T>
where
    T: FromStr + Default,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed.parse().map_err(|_| EditorError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn parse_brightness(raw: &str) -> Result<u8> {
    let value: i64 = parse_number("brightness", raw)?;
    if !(0..=MAX_BRIGHTNESS).contains(&value) {
        return Err(EditorError::InvalidBrightness { value });
    }
    u8::try_from(value).map_err(|_| EditorError::InvalidBrightness { value })
}

/// Check `path` has one of the `accepted` extensions (".png" style).
///
/// An empty list accepts anything.
fn check_file_type<S: AsRef<str>>(path: &str, accepted: &[S]) -> Result<()> {
    if accepted.is_empty() {
        return Ok(());
    }
    let extension = Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    if accepted
        .iter()
        .any(|a| a.as_ref().eq_ignore_ascii_case(&extension))
    {
        return Ok(());
    }
    Err(EditorError::InvalidFileType {
        path: path.to_string(),
        accepted: accepted.iter().map(|a| a.as_ref().to_string()).collect(),
    })
}

/// Validate `raw` for a handler field and store it in `values`.
///
/// On error `values` is untouched.
pub fn apply_field(values: &mut BTreeMap<String, String>, field: &Field, raw: &str) -> Result<()> {
    let stored = match &field.kind {
        FieldKind::Text => raw.to_string(),
        FieldKind::File { file_types } => {
            if !raw.is_empty() {
                check_file_type(raw, file_types.as_slice())?;
            }
            raw.to_string()
        }
        FieldKind::Number => parse_number::<i64>(&field.name, raw)?.to_string(),
        FieldKind::TextAlignment => TextAlignment::from_str(raw)?.as_str().to_string(),
        FieldKind::Select { values: allowed } => {
            if !allowed.iter().any(|v| v == raw) {
                return Err(EditorError::InvalidSelection {
                    field: field.name.clone(),
                    value: raw.to_string(),
                    allowed: allowed.clone(),
                });
            }
            raw.to_string()
        }
    };
    debug!(field = %field.name, kind = field.kind.type_name(), "Applied field edit");
    values.insert(field.name.clone(), stored);
    Ok(())
}

/// What an edit form shows for one handler field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum EditControl {
    Entry {
        name: String,
        title: String,
        value: String,
    },
    FilePicker {
        name: String,
        title: String,
        file_types: Vec<String>,
        value: String,
    },
    NumberEntry {
        name: String,
        title: String,
        value: String,
    },
    AlignmentSelect {
        name: String,
        title: String,
        selected: Option<TextAlignment>,
    },
    Select {
        name: String,
        title: String,
        options: Vec<String>,
        selected: Option<String>,
    },
}

impl EditControl {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Entry { name, .. }
            | Self::FilePicker { name, .. }
            | Self::NumberEntry { name, .. }
            | Self::AlignmentSelect { name, .. }
            | Self::Select { name, .. } => name,
        }
    }
}

/// One control per field, filled from the stored `values`.
#[must_use]
pub fn controls_for(fields: &[Field], values: &BTreeMap<String, String>) -> Vec<EditControl> {
    fields
        .iter()
        .map(|field| {
            let name = field.name.clone();
            let title = field.title.clone();
            let value = values.get(&field.name).cloned().unwrap_or_default();
            match &field.kind {
                FieldKind::Text => EditControl::Entry { name, title, value },
                FieldKind::File { file_types } => EditControl::FilePicker {
                    name,
                    title,
                    file_types: file_types.clone(),
                    value,
                },
                FieldKind::Number => EditControl::NumberEntry { name, title, value },
                FieldKind::TextAlignment => EditControl::AlignmentSelect {
                    name,
                    title,
                    selected: TextAlignment::from_str(&value).ok(),
                },
                FieldKind::Select { values: options } => EditControl::Select {
                    name,
                    title,
                    options: options.clone(),
                    selected: options.contains(&value).then_some(value),
                },
            }
        })
        .collect()
}

/// Current built-in settings of one side, as shown in the edit form.
#[must_use]
pub fn builtin_values(config: &KeyConfig, kind: HandlerKind) -> Vec<(&'static str, String)> {
    match kind {
        HandlerKind::Icon => vec![
            ("text", config.text.clone()),
            (
                "text_size",
                if config.text_size == 0 {
                    String::new()
                } else {
                    config.text_size.to_string()
                },
            ),
            (
                "text_alignment",
                config
                    .text_alignment
                    .map(|a| a.as_str().to_string())
                    .unwrap_or_default(),
            ),
            ("icon", config.icon.clone()),
        ],
        HandlerKind::Key => vec![
            ("url", config.url.clone()),
            ("switch_page", config.switch_page.to_string()),
            ("keybind", config.keybind.clone()),
            ("command", config.command.clone()),
            ("brightness", config.brightness.to_string()),
        ],
    }
}

/// Set the icon or key handler of `config`.
///
/// `Default` is stored as the empty name. Unknown or incapable handlers are
/// rejected without touching `config`.
pub fn choose_handler(
    config: &mut KeyConfig,
    registry: &HandlerRegistry,
    kind: HandlerKind,
    name: &str,
) -> Result<()> {
    let module = registry.lookup_for(name, kind)?;
    let stored = if module.is_builtin() {
        String::new()
    } else {
        module.name.clone()
    };
    match kind {
        HandlerKind::Icon => config.icon_handler = stored,
        HandlerKind::Key => config.key_handler = stored,
    }
    debug!(%kind, handler = name, "Handler chosen");
    Ok(())
}

/// Set a field of the handler currently chosen for `kind`.
pub fn set_handler_field(
    config: &mut KeyConfig,
    registry: &HandlerRegistry,
    kind: HandlerKind,
    field_name: &str,
    raw: &str,
) -> Result<()> {
    let handler = match kind {
        HandlerKind::Icon => config.icon_handler_label().to_string(),
        HandlerKind::Key => config.key_handler_label().to_string(),
    };
    let module = registry.lookup_for(&handler, kind)?;
    let field = module.field(kind, field_name).ok_or_else(|| {
        warn!(handler = %handler, field = field_name, "Unknown handler field");
        EditorError::FieldNotFound {
            handler: handler.clone(),
            field: field_name.to_string(),
        }
    })?;
    let values = match kind {
        HandlerKind::Icon => &mut config.icon_handler_fields,
        HandlerKind::Key => &mut config.key_handler_fields,
    };
    apply_field(values, field, raw)
}
