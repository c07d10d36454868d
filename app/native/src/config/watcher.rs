//! Configuration file watcher.
//!
//! Watches the loaded configuration file for changes and invokes a
//! callback when it is modified. The sync engine uses this to request a
//! forced regeneration cycle; restart the app to apply structural
//! configuration changes.

use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::get_config_path;
use crate::constants::timing::CONFIG_DEBOUNCE_MS;

/// Starts watching the configuration file for changes.
///
/// Spawns a background thread that watches the config file's parent
/// directory (to catch editors that save via temp-file rename) and calls
/// `on_change` on each debounced modification.
///
/// Does nothing when no configuration file was loaded.
pub fn watch_config_file<F>(on_change: F)
where F: Fn() + Send + 'static {
    let Some(config_path) = get_config_path().cloned() else {
        // No config file loaded, nothing to watch
        return;
    };

    let config_filename =
        config_path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();

    std::thread::spawn(move || {
        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
            Ok(w) => w,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create config watcher");
                return;
            }
        };

        // Watch the parent directory to catch file replacements
        let watch_path = config_path.parent().unwrap_or(&config_path);

        if let Err(err) = watcher.watch(watch_path, RecursiveMode::NonRecursive) {
            tracing::warn!(error = %err, "failed to watch config file");
            return;
        }

        let mut last_event_time: Option<Instant> = None;
        let debounce_duration = Duration::from_millis(CONFIG_DEBOUNCE_MS);

        loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    let affects_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().is_some_and(|name| name == config_filename));

                    if !affects_config {
                        continue;
                    }

                    // Some editors trigger several events per save
                    let now = Instant::now();
                    if last_event_time.is_some_and(|t| now.duration_since(t) < debounce_duration) {
                        continue;
                    }
                    last_event_time = Some(now);

                    tracing::info!(
                        path = %config_path.display(),
                        "config file changed, requesting refresh"
                    );
                    on_change();
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "config watch error");
                }
                Err(_) => {
                    // Channel closed, watcher dropped
                    break;
                }
            }
        }
    });
}
