//! System wallpaper lookup.

use super::{SourceIdentity, SourceProvider};

/// Source provider backed by the operating system's current wallpaper.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSourceProvider;

impl SystemSourceProvider {
    /// Creates a new provider.
    #[must_use]
    pub const fn new() -> Self { Self }
}

impl SourceProvider for SystemSourceProvider {
    fn current_source(&self) -> Option<SourceIdentity> {
        match wallpaper::get() {
            Ok(path) if !path.trim().is_empty() => Some(path),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(error = %err, "system wallpaper lookup failed");
                None
            }
        }
    }
}
