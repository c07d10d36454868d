//! Unix Domain Socket bridge to the panel process.
//!
//! The panel (the process that actually renders the backdrop and scrim)
//! connects to a socket inside the cache directory and exchanges
//! newline-delimited JSON with the engine:
//!
//! - Inbound: geometry, theme, and lifecycle facts
//!   (`{"type": "viewportMoved", "x": 0, "y": 0, "width": 400, "height": 40}`)
//! - Outbound: render commands
//!   (`{"type": "backdrop", "path": "/path/to/backdrop-final.jpg"}`)
//!
//! A connection that stops accepting writes is dropped from the client
//! registry on the next broadcast.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use super::{HostEvent, RenderSurface, Theme};
use crate::constants::SOCKET_FILENAME;
use crate::geometry::{Display, Point, Rect};
use crate::platform::thread::spawn_named_thread;

// ============================================================================
// Wire Types
// ============================================================================

/// A display as reported by the panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub builtin: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

const fn default_scale_factor() -> f64 { 1.0 }

impl From<DisplayInfo> for Display {
    fn from(info: DisplayInfo) -> Self {
        Self::new(
            Rect::new(info.x, info.y, info.width, info.height),
            info.primary,
            info.builtin,
            info.scale_factor,
        )
    }
}

/// Messages sent from the panel to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// The panel window moved.
    ViewportMoved { x: f64, y: f64, width: f64, height: f64 },
    /// The panel window was resized.
    ViewportResized { x: f64, y: f64, width: f64, height: f64 },
    /// The display enumeration changed.
    Displays { displays: Vec<DisplayInfo> },
    /// The host theme changed.
    Theme { theme: Theme },
    /// The panel entered or left fullscreen.
    Fullscreen { active: bool },
    /// The panel finished its crossfade.
    TransitionFinished,
    /// Request an immediate sync cycle.
    Refresh {
        #[serde(default)]
        force: bool,
    },
}

impl From<HostMessage> for HostEvent {
    fn from(message: HostMessage) -> Self {
        match message {
            HostMessage::ViewportMoved { x, y, width, height } => {
                Self::ViewportMoved(Rect::new(x, y, width, height))
            }
            HostMessage::ViewportResized { x, y, width, height } => {
                Self::ViewportResized(Rect::new(x, y, width, height))
            }
            HostMessage::Displays { displays } => {
                Self::DisplaysChanged(displays.into_iter().map(Display::from).collect())
            }
            HostMessage::Theme { theme } => Self::ThemeChanged(theme),
            HostMessage::Fullscreen { active } => Self::FullscreenChanged(active),
            HostMessage::TransitionFinished => Self::TransitionFinished,
            HostMessage::Refresh { force } => Self::RefreshRequested { force },
        }
    }
}

/// Render commands sent from the engine to the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderCommand {
    /// Display a new backdrop artifact (with a crossfade).
    Backdrop { path: PathBuf },
    /// Translate the backdrop under the viewport.
    Offset { x: f64, y: f64 },
    /// Apply a new scrim color.
    Overlay { color: String },
}

// ============================================================================
// Server
// ============================================================================

/// The engine side of the panel bridge.
pub struct IpcServer {
    socket_path: PathBuf,
    clients: Mutex<Vec<UnixStream>>,
    events: UnboundedSender<HostEvent>,
}

impl IpcServer {
    /// Binds the socket and starts accepting panel connections.
    ///
    /// A stale socket file from a previous run is removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the socket cannot be bound.
    pub fn start(
        dir: &Path,
        events: UnboundedSender<HostEvent>,
    ) -> std::io::Result<Arc<Self>> {
        std::fs::create_dir_all(dir)?;
        let socket_path = dir.join(SOCKET_FILENAME);

        // A leftover socket from a crashed instance blocks binding
        if socket_path.exists() {
            let _ = std::fs::remove_file(&socket_path);
        }

        let listener = UnixListener::bind(&socket_path)?;
        tracing::info!(path = %socket_path.display(), "panel bridge listening");

        let server = Arc::new(Self {
            socket_path,
            clients: Mutex::new(Vec::new()),
            events,
        });

        let accept_server = Arc::clone(&server);
        spawn_named_thread("ipc-accept", move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => accept_server.register_client(stream),
                    Err(err) => {
                        tracing::warn!(error = %err, "panel bridge accept failed");
                        break;
                    }
                }
            }
        });

        Ok(server)
    }

    /// Returns the socket path clients connect to.
    #[must_use]
    pub fn socket_path(&self) -> &Path { &self.socket_path }

    /// Registers a new panel connection and spawns its reader.
    fn register_client(self: &Arc<Self>, stream: UnixStream) {
        match stream.try_clone() {
            Ok(writer) => self.clients.lock().push(writer),
            Err(err) => {
                tracing::warn!(error = %err, "failed to clone panel connection");
                return;
            }
        }

        let reader_server = Arc::clone(self);
        spawn_named_thread("ipc-client", move || reader_server.read_client(stream));
    }

    /// Reads newline-delimited messages from one panel connection until it
    /// disconnects.
    fn read_client(&self, stream: UnixStream) {
        let reader = BufReader::new(stream);

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::debug!(error = %err, "panel connection closed");
                    return;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<HostMessage>(&line) {
                Ok(message) => {
                    if self.events.send(message.into()).is_err() {
                        // Engine is gone, stop reading
                        return;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed panel message");
                }
            }
        }
    }

    /// Sends a render command to every connected panel, dropping
    /// connections that fail to accept the write.
    fn broadcast(&self, command: &RenderCommand) {
        let payload = match serde_json::to_string(command) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode render command");
                return;
            }
        };

        let mut clients = self.clients.lock();
        clients.retain_mut(|client| writeln!(client, "{payload}").is_ok());
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) { let _ = std::fs::remove_file(&self.socket_path); }
}

impl RenderSurface for IpcServer {
    fn show_backdrop(&self, path: &Path) {
        self.broadcast(&RenderCommand::Backdrop { path: path.to_path_buf() });
    }

    fn set_backdrop_offset(&self, offset: Point) {
        self.broadcast(&RenderCommand::Offset { x: offset.x, y: offset.y });
    }

    fn set_overlay_color(&self, color: &str) {
        self.broadcast(&RenderCommand::Overlay { color: color.to_string() });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_host_message_viewport_roundtrip() {
        let json = r#"{"type": "viewportMoved", "x": 10.0, "y": 20.0, "width": 400.0, "height": 40.0}"#;
        let message: HostMessage = serde_json::from_str(json).unwrap();

        let event: HostEvent = message.into();
        assert_eq!(event, HostEvent::ViewportMoved(Rect::new(10.0, 20.0, 400.0, 40.0)));
    }

    #[test]
    fn test_host_message_displays_defaults() {
        let json = r#"{"type": "displays", "displays": [{"x": 0, "y": 0, "width": 1920, "height": 1080}]}"#;
        let message: HostMessage = serde_json::from_str(json).unwrap();

        let HostEvent::DisplaysChanged(displays) = message.into() else {
            panic!("expected DisplaysChanged");
        };
        assert_eq!(displays.len(), 1);
        assert!(!displays[0].is_primary);
        assert!((displays[0].scale_factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_host_message_theme() {
        let json = r#"{"type": "theme", "theme": "light"}"#;
        let message: HostMessage = serde_json::from_str(json).unwrap();
        assert_eq!(HostEvent::from(message), HostEvent::ThemeChanged(Theme::Light));
    }

    #[test]
    fn test_host_message_refresh_defaults_to_unforced() {
        let message: HostMessage = serde_json::from_str(r#"{"type": "refresh"}"#).unwrap();
        assert_eq!(HostEvent::from(message), HostEvent::RefreshRequested { force: false });
    }

    #[test]
    fn test_render_command_serializes_with_type_tag() {
        let command = RenderCommand::Overlay { color: "rgba(0, 0, 0, 0.50)".to_string() };
        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains(r#""type":"overlay""#));
        assert!(json.contains("rgba(0, 0, 0, 0.50)"));
    }

    #[test]
    fn test_server_receives_events_and_broadcasts_commands() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let server = IpcServer::start(dir.path(), tx).unwrap();

        let mut client = UnixStream::connect(server.socket_path()).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        writeln!(client, r#"{{"type": "transitionFinished"}}"#).unwrap();

        // The reader thread needs a moment to register and parse
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let event = loop {
            match rx.try_recv() {
                Ok(event) => break event,
                Err(_) if std::time::Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(err) => panic!("no event received: {err}"),
            }
        };
        assert_eq!(event, HostEvent::TransitionFinished);

        // Outbound: the server broadcast reaches the connected client
        server.set_overlay_color("rgba(1, 2, 3, 0.40)");
        let mut line = String::new();
        BufReader::new(&client).read_line(&mut line).unwrap();
        assert!(line.contains("rgba(1, 2, 3, 0.40)"));
    }

    #[test]
    fn test_stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(SOCKET_FILENAME);
        std::fs::write(&stale, b"stale").unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let server = IpcServer::start(dir.path(), tx).unwrap();
        assert!(UnixStream::connect(server.socket_path()).is_ok());
    }
}
