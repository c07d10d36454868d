//! Thread spawning helpers.

use std::thread;

/// Spawns a background thread with a `frost-` prefixed name.
///
/// Spawn failures are logged instead of propagated; callers treat the
/// thread as best-effort infrastructure.
pub fn spawn_named_thread<F>(name: &str, task: F)
where F: FnOnce() + Send + 'static {
    let thread_name = format!("frost-{name}");

    if let Err(err) = thread::Builder::new().name(thread_name.clone()).spawn(task) {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    }
}
