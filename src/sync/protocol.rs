//! Wire protocol spoken with the deck daemon.
//!
//! Every message is a little-endian `u32` length prefix followed by a JSON
//! body. A request carries an `id` that the matching response echoes. The
//! page subscription connection receives [`Event`] messages after its
//! initial response.

use std::io::{Read, Write};

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use super::info::DeviceInfo;
use crate::config::{Config, KeyConfig, Module};
use crate::error::{EditorError, Result};

/// Upper bound on a single message body.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A daemon request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    GetConfig,
    SetConfig { config: Config },
    CommitConfig,
    ReloadConfig,
    SetPage { serial: String, page: usize },
    PressButton { serial: String, key_index: usize },
    GetModules,
    GetDevices,
    GetHandlerPreview { serial: String, config: KeyConfig },
    SubscribePages,
}

impl Request {
    /// Wire name of the request, used in errors and logs.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::GetConfig => "get_config",
            Self::SetConfig { .. } => "set_config",
            Self::CommitConfig => "commit_config",
            Self::ReloadConfig => "reload_config",
            Self::SetPage { .. } => "set_page",
            Self::PressButton { .. } => "press_button",
            Self::GetModules => "get_modules",
            Self::GetDevices => "get_devices",
            Self::GetHandlerPreview { .. } => "get_handler_preview",
            Self::SubscribePages => "subscribe_pages",
        }
    }
}

/// A request tagged with its correlation id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestEnvelope {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: Request,
}

impl RequestEnvelope {
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
        }
    }
}

/// Successful response payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Reply {
    Done,
    Config(Config),
    Modules(Vec<Module>),
    Devices(Vec<DeviceInfo>),
    /// Base64-encoded PNG.
    Image(String),
}

impl Reply {
    /// Encode an image as a PNG reply.
    pub fn image(image: &image::DynamicImage) -> Result<Self> {
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| EditorError::Protocol(format!("Failed to encode preview: {e}")))?;
        Ok(Self::Image(
            base64::engine::general_purpose::STANDARD.encode(png),
        ))
    }

    /// Decode an image reply.
    pub fn decode_image(encoded: &str) -> Result<image::DynamicImage> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| EditorError::Protocol(format!("Invalid preview encoding: {e}")))?;
        image::load_from_memory(&bytes)
            .map_err(|e| EditorError::Protocol(format!("Invalid preview image: {e}")))
    }
}

/// Response to a [`RequestEnvelope`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponseEnvelope {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    #[must_use]
    pub const fn ok(id: Uuid, reply: Reply) -> Self {
        Self {
            id,
            result: Some(reply),
            error: None,
        }
    }

    #[must_use]
    pub fn err(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Convert into the reply, mapping a daemon-side error.
    pub fn into_reply(self, method: &str) -> Result<Reply> {
        match (self.result, self.error) {
            (_, Some(message)) => Err(EditorError::Daemon {
                method: method.to_string(),
                message,
            }),
            (Some(reply), None) => Ok(reply),
            (None, None) => Err(EditorError::Protocol(format!(
                "Empty response to '{method}'"
            ))),
        }
    }
}

/// Asynchronous notifications on the subscription connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    PageChanged { serial: String, page: usize },
}

/// Write a length-prefixed JSON message.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg)
        .map_err(|e| EditorError::Protocol(format!("Failed to serialize message: {e}")))?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(EditorError::Protocol(format!(
            "Message too large: {} bytes (max {MAX_MESSAGE_SIZE})",
            json.len()
        )));
    }
    let len = u32::try_from(json.len())
        .map_err(|_| EditorError::Protocol("Message length overflow".to_string()))?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;
    trace!(bytes = json.len(), "Wrote message");
    Ok(())
}

/// Read a length-prefixed JSON message.
pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(EditorError::Protocol(format!(
            "Message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    trace!(bytes = len, "Read message");
    serde_json::from_slice(&body)
        .map_err(|e| EditorError::Protocol(format!("Failed to parse message: {e}")))
}
