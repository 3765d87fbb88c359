//! Sample configurations and temporary files.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use sde::config::{Config, Deck, Field, FieldKind, Key, KeyConfig, Module, Page};

/// Serial of the 3x2 test deck.
pub const SMALL: &str = "AL12";
/// Serial of the 5x3 test deck.
pub const LARGE: &str = "BX34";

/// A key whose default config shows `text`.
#[must_use]
pub fn text_key(text: &str) -> Key {
    Key::with_default(KeyConfig {
        text: text.to_string(),
        ..KeyConfig::default()
    })
}

/// A page of `len` keys with `keys` placed at the given indices.
#[must_use]
pub fn page_with(len: usize, keys: &[(usize, Key)]) -> Page {
    let mut page = Page::empty(len);
    for (index, key) in keys {
        page.keys[*index] = key.clone();
    }
    page
}

/// A deck of six-key pages, two of them: "A" at key 2 on page 0, "B" at key 0 on page 1.
#[must_use]
pub fn two_page_deck(serial: &str) -> Deck {
    Deck {
        serial: serial.to_string(),
        pages: vec![
            page_with(6, &[(2, text_key("A"))]),
            page_with(6, &[(0, text_key("B"))]),
        ],
    }
}

#[must_use]
pub fn config_of(decks: Vec<Deck>) -> Config {
    Config { decks }
}

/// Handler modules a typical daemon reports.
#[must_use]
pub fn sample_modules() -> Vec<Module> {
    vec![
        Module {
            name: "Clock".to_string(),
            is_icon: true,
            is_key: false,
            icon_fields: vec![
                Field::new(
                    "format",
                    "Format",
                    FieldKind::Select {
                        values: vec!["12h".to_string(), "24h".to_string()],
                    },
                ),
                Field::new("size", "Size", FieldKind::Number),
            ],
            key_fields: Vec::new(),
        },
        Module {
            name: "Gif".to_string(),
            is_icon: true,
            is_key: false,
            icon_fields: vec![Field::new(
                "file",
                "Animation",
                FieldKind::File {
                    file_types: vec![".gif".to_string()],
                },
            )],
            key_fields: Vec::new(),
        },
        Module {
            name: "Counter".to_string(),
            is_icon: true,
            is_key: true,
            icon_fields: vec![Field::new("label", "Label", FieldKind::Text)],
            key_fields: vec![Field::new("step", "Step", FieldKind::Number)],
        },
    ]
}

/// Temporary settings file with automatic cleanup.
pub struct TestSettings {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestSettings {
    /// Write `content` to `name` inside a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn write(name: &str, content: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write settings file");
        Self { dir, path }
    }

    #[must_use]
    pub fn path_str(&self) -> &str {
        self.path.to_str().expect("Path is not valid UTF-8")
    }
}

/// Write a solid-color PNG icon into `dir`.
///
/// # Panics
///
/// Panics if the image cannot be saved.
#[must_use]
pub fn write_icon(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(72, 72, Rgb([200, 40, 40]))
        .save(&path)
        .unwrap_or_else(|_| panic!("Failed to save image at {path:?}"));
    path
}
