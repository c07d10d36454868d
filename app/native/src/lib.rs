//! Frost - keeps a blurred rendition of the desktop wallpaper in sync
//! behind a floating panel.
//!
//! The engine watches two independently changing inputs - the current
//! wallpaper and the panel's geometry - and maintains two cached blurred
//! artifacts (a fast preview and a high-quality final rendition) that are
//! crossfaded onto the panel as they become available. It also derives a
//! scrim overlay color from the worst-case brightness of the wallpaper
//! region visible behind the panel.
//!
//! The panel itself is a separate process that connects over a Unix
//! socket; see [`host::ipc`] for the wire protocol.

// Core modules
pub mod brightness;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod host;
pub mod overlay;
pub mod platform;
pub mod processing;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::FrostError;
use crate::host::HostEvent;
use crate::sync::SyncEngine;

/// Startup options from the command line.
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Configuration file overriding the default search paths.
    pub config_path: Option<PathBuf>,
    /// Force a full regeneration on startup.
    pub force: bool,
}

/// Runs the sync engine until shutdown.
///
/// Initializes configuration and the cache directory, binds the panel
/// bridge, and drives the engine on a current-thread tokio runtime.
///
/// # Errors
///
/// Returns an error when no writable cache directory exists anywhere,
/// when the panel socket cannot be bound, or when the runtime fails to
/// start. All of these abort initialization; failures after startup are
/// handled inside the engine loop instead.
pub fn run(options: RunOptions) -> Result<(), FrostError> {
    if let Some(path) = options.config_path {
        config::set_custom_config_path(path);
    }
    let config = config::init().clone();

    if !config.backdrop.is_enabled() {
        tracing::info!("backdrop disabled in configuration, nothing to do");
        return Ok(());
    }

    let backdrop_dir = cache::ensure_backdrop_dir()?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    runtime.block_on(async move {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let surface = host::ipc::IpcServer::start(&cache::get_cache_dir(), events_tx.clone())
            .map_err(|err| FrostError::Ipc(err.to_string()))?;

        // Config changes map onto a forced refresh; restart to apply
        // structural changes.
        let watcher_events = events_tx.clone();
        config::watch_config_file(move || {
            let _ = watcher_events.send(HostEvent::RefreshRequested { force: true });
        });

        if options.force {
            let _ = events_tx.send(HostEvent::RefreshRequested { force: true });
        }

        let engine = SyncEngine::new(
            config,
            Arc::new(host::system::SystemSourceProvider::new()),
            surface,
            Arc::new(processing::ImageProcessor::new()),
            events_rx,
            &backdrop_dir,
        );

        engine.run().await;
        Ok(())
    })
}
