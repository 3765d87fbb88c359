//! Handler module descriptors reported by the daemon.

use serde::{Deserialize, Serialize};

use super::key_config::DEFAULT_HANDLER;

/// Typed parameter kinds a handler can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// File path, optionally restricted to extensions such as `.gif`.
    File { file_types: Vec<String> },
    /// Integer, stored in its decimal string form.
    Number,
    /// One of TOP/MIDDLE/BOTTOM.
    TextAlignment,
    /// One of a fixed set of values.
    Select { values: Vec<String> },
}

impl FieldKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::File { .. } => "File",
            Self::Number => "Number",
            Self::TextAlignment => "TextAlignment",
            Self::Select { .. } => "Select",
        }
    }
}

/// A single handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct Field {
    /// Key in the handler's field map.
    pub name: String,
    /// Human-readable label.
    pub title: String,
    pub kind: FieldKind,
}

/// Flat wire form of [`Field`].
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RawField {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    file_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
}

impl TryFrom<RawField> for Field {
    type Error = String;

    fn try_from(raw: RawField) -> std::result::Result<Self, Self::Error> {
        let kind = match raw.kind.as_str() {
            "Text" => FieldKind::Text,
            "File" => FieldKind::File {
                file_types: raw.file_types,
            },
            "Number" => FieldKind::Number,
            "TextAlignment" => FieldKind::TextAlignment,
            "Select" => FieldKind::Select { values: raw.values },
            other => return Err(format!("unknown field type '{other}' for field '{}'", raw.name)),
        };
        Ok(Self {
            name: raw.name,
            title: raw.title,
            kind,
        })
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> Self {
        let kind = field.kind.type_name().to_string();
        let (file_types, values) = match field.kind {
            FieldKind::File { file_types } => (file_types, Vec::new()),
            FieldKind::Select { values } => (Vec::new(), values),
            FieldKind::Text | FieldKind::Number | FieldKind::TextAlignment => {
                (Vec::new(), Vec::new())
            }
        };
        Self {
            name: field.name,
            title: field.title,
            kind,
            file_types,
            values,
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, title: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            kind,
        }
    }
}

/// Which side of a key a handler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Icon,
    Key,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Icon => "icon",
            Self::Key => "key",
        })
    }
}

/// A pluggable icon renderer and/or key action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub is_icon: bool,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icon_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_fields: Vec<Field>,
}

impl Module {
    /// The synthetic built-in module: both capabilities, no fields.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            name: DEFAULT_HANDLER.to_string(),
            is_icon: true,
            is_key: true,
            icon_fields: Vec::new(),
            key_fields: Vec::new(),
        }
    }

    /// True if this is the built-in module.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.name == DEFAULT_HANDLER
    }

    /// Whether the module can act as the given kind of handler.
    #[must_use]
    pub const fn supports(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Icon => self.is_icon,
            HandlerKind::Key => self.is_key,
        }
    }

    /// Fields the module needs for the given kind.
    #[must_use]
    pub fn fields(&self, kind: HandlerKind) -> &[Field] {
        match kind {
            HandlerKind::Icon => &self.icon_fields,
            HandlerKind::Key => &self.key_fields,
        }
    }

    /// Find a field by name.
    #[must_use]
    pub fn field(&self, kind: HandlerKind, name: &str) -> Option<&Field> {
        self.fields(kind).iter().find(|f| f.name == name)
    }
}
