//! [`SyncClient`] over a Unix domain socket.

use std::io::Read;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, info, instrument, trace, warn};

use super::protocol::{Event, Reply, Request, RequestEnvelope, ResponseEnvelope, read_message, write_message};
use super::{DeviceInfo, PageEvent, PageListener, SyncClient};
use crate::config::{Config, KeyConfig, Module};
use crate::error::{EditorError, Result};

/// Socket file name inside the runtime directory.
const SOCKET_NAME: &str = "streamdeckd.sock";

/// Default daemon socket path (`XDG_RUNTIME_DIR`, falling back to the cache dir).
pub fn default_socket_path() -> Result<PathBuf> {
    if let Some(runtime_dir) = dirs::runtime_dir() {
        return Ok(runtime_dir.join(SOCKET_NAME));
    }
    let cache = dirs::cache_dir().ok_or_else(|| {
        EditorError::Settings(
            "Could not determine a runtime or cache directory for the daemon socket".to_string(),
        )
    })?;
    Ok(cache.join(SOCKET_NAME))
}

/// Blocking daemon client.
///
/// Requests share one connection, reopened after an I/O failure. The page
/// listener runs on its own connection and thread.
pub struct SocketClient {
    path: PathBuf,
    timeout: Duration,
    stream: Mutex<Option<UnixStream>>,
}

impl SocketClient {
    /// Create a client for the socket at `path`; connects lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
            stream: Mutex::new(None),
        }
    }

    /// Create a client and check the daemon is reachable.
    pub fn connect(path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Self::new(path, timeout);
        let stream = client.open()?;
        *client.lock_stream() = Some(stream);
        info!(path = %client.path.display(), "Connected to daemon");
        Ok(client)
    }

    /// Socket path this client talks to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_stream(&self) -> std::sync::MutexGuard<'_, Option<UnixStream>> {
        // A poisoned lock only means a previous request panicked mid-call.
        self.stream
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn open(&self) -> Result<UnixStream> {
        let stream =
            UnixStream::connect(&self.path).map_err(|e| EditorError::DaemonUnavailable {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        let timeout = Some(self.timeout).filter(|t| !t.is_zero());
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        Ok(stream)
    }

    #[instrument(skip(self, request), fields(method = request.method()))]
    fn call(&self, request: Request) -> Result<Reply> {
        let method = request.method();
        let envelope = RequestEnvelope::new(request);
        let mut guard = self.lock_stream();
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(EditorError::Protocol("connection unavailable".to_string()));
        };

        let outcome = write_message(stream, &envelope)
            .and_then(|()| read_message::<_, ResponseEnvelope>(stream));
        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                // The stream may hold a half-read frame now; start fresh next time.
                *guard = None;
                return Err(match err {
                    EditorError::Io(io) => EditorError::Daemon {
                        method: method.to_string(),
                        message: io.to_string(),
                    },
                    other => other,
                });
            }
        };

        if response.id != envelope.id {
            *guard = None;
            return Err(EditorError::Protocol(format!(
                "Response id {} does not match request {}",
                response.id, envelope.id
            )));
        }
        trace!("Daemon replied");
        response.into_reply(method)
    }

    fn expect_done(&self, request: Request) -> Result<()> {
        let method = request.method();
        match self.call(request)? {
            Reply::Done => Ok(()),
            other => Err(unexpected(method, &other)),
        }
    }
}

fn unexpected(method: &str, reply: &Reply) -> EditorError {
    let kind = match reply {
        Reply::Done => "done",
        Reply::Config(_) => "config",
        Reply::Modules(_) => "modules",
        Reply::Devices(_) => "devices",
        Reply::Image(_) => "image",
    };
    EditorError::Protocol(format!("Unexpected '{kind}' reply to '{method}'"))
}

impl SyncClient for SocketClient {
    fn get_config(&self) -> Result<Config> {
        match self.call(Request::GetConfig)? {
            Reply::Config(config) => Ok(config),
            other => Err(unexpected("get_config", &other)),
        }
    }

    fn set_config(&self, config: &Config) -> Result<()> {
        self.expect_done(Request::SetConfig {
            config: config.clone(),
        })
    }

    fn commit_config(&self) -> Result<()> {
        self.expect_done(Request::CommitConfig)
    }

    fn reload_config(&self) -> Result<()> {
        self.expect_done(Request::ReloadConfig)
    }

    fn set_page(&self, serial: &str, page: usize) -> Result<()> {
        self.expect_done(Request::SetPage {
            serial: serial.to_string(),
            page,
        })
    }

    fn register_page_listener(&self, listener: PageListener) -> Result<()> {
        let mut stream = self.open()?;
        let envelope = RequestEnvelope::new(Request::SubscribePages);
        write_message(&mut stream, &envelope)?;
        let response: ResponseEnvelope = read_message(&mut stream)?;
        response.into_reply("subscribe_pages")?;

        // Events arrive whenever the device changes page; no deadline applies.
        stream.set_read_timeout(None)?;
        let path = self.path.clone();
        thread::Builder::new()
            .name("sde-page-listener".to_string())
            .spawn(move || listen(stream, &path, &listener))?;
        debug!("Page listener registered");
        Ok(())
    }

    fn press_button(&self, serial: &str, key_index: usize) -> Result<()> {
        self.expect_done(Request::PressButton {
            serial: serial.to_string(),
            key_index,
        })
    }

    fn get_modules(&self) -> Result<Vec<Module>> {
        match self.call(Request::GetModules)? {
            Reply::Modules(modules) => Ok(modules),
            other => Err(unexpected("get_modules", &other)),
        }
    }

    fn get_devices(&self) -> Result<Vec<DeviceInfo>> {
        match self.call(Request::GetDevices)? {
            Reply::Devices(devices) => Ok(devices),
            other => Err(unexpected("get_devices", &other)),
        }
    }

    fn get_handler_preview(&self, serial: &str, config: &KeyConfig) -> Result<DynamicImage> {
        match self.call(Request::GetHandlerPreview {
            serial: serial.to_string(),
            config: config.clone(),
        })? {
            Reply::Image(encoded) => Reply::decode_image(&encoded),
            other => Err(unexpected("get_handler_preview", &other)),
        }
    }
}

/// Deliver page events until the connection fails.
fn listen<R: Read>(mut stream: R, path: &Path, listener: &PageListener) {
    loop {
        match read_message::<_, Event>(&mut stream) {
            Ok(Event::PageChanged { serial, page }) => {
                trace!(serial = %serial, page, "Page event");
                listener(PageEvent { serial, page });
            }
            // The whole frame was consumed, so the stream is still aligned.
            Err(EditorError::Protocol(message)) => {
                warn!(path = %path.display(), error = %message, "Skipping malformed page event");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Page listener stopped");
                return;
            }
        }
    }
}
