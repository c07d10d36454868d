//! Host integration boundary.
//!
//! The sync engine treats everything outside itself as capabilities
//! injected once at startup: a [`SourceProvider`] that knows the current
//! wallpaper, a [`RenderSurface`] that displays the backdrop and scrim,
//! and a stream of [`HostEvent`]s describing geometry, theme, and
//! lifecycle changes. The engine owns none of these facts.

pub mod ipc;
pub mod system;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::{Display, Point, Rect};

/// The identity of the current source image. Compared by value; a change
/// in identity is what "wallpaper changed" means.
pub type SourceIdentity = String;

/// Host UI theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light UI theme.
    Light,
    /// Dark UI theme.
    #[default]
    Dark,
}

/// Events delivered by the windowing host (or internal collaborators that
/// behave like it, such as the config watcher).
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The panel window moved.
    ViewportMoved(Rect),
    /// The panel window was resized.
    ViewportResized(Rect),
    /// The display enumeration changed.
    DisplaysChanged(Vec<Display>),
    /// The host theme changed.
    ThemeChanged(Theme),
    /// The panel entered or left fullscreen/maximized state.
    FullscreenChanged(bool),
    /// The panel finished its visual crossfade.
    TransitionFinished,
    /// A sync cycle was requested out of band.
    RefreshRequested {
        /// Regenerate even if nothing looks stale.
        force: bool,
    },
    /// Stop the engine loop.
    Shutdown,
}

/// Supplies the identity of the current source image.
pub trait SourceProvider: Send + Sync {
    /// Returns the current source image identity, or `None` when it is
    /// temporarily unavailable. Unavailability is a transient condition,
    /// not an error.
    fn current_source(&self) -> Option<SourceIdentity>;
}

/// The surface that renders the backdrop and scrim.
///
/// Calls are fire-and-forget: completion of the visual crossfade comes
/// back asynchronously as [`HostEvent::TransitionFinished`].
pub trait RenderSurface: Send + Sync {
    /// Starts displaying a new backdrop artifact (with a crossfade).
    fn show_backdrop(&self, path: &Path);

    /// Moves the backdrop image under the viewport.
    fn set_backdrop_offset(&self, offset: Point);

    /// Applies a new scrim overlay color.
    fn set_overlay_color(&self, color: &str);
}
