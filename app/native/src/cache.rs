//! Cache directory utilities.
//!
//! Provides the application's cache directory and the writable directory
//! probe used before any backdrop artifact is generated. Uses
//! `~/Library/Caches/frost` (or the platform equivalent) with a fallback
//! to `/tmp/frost` if the user cache directory is unavailable.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{APP_NAME, BACKDROP_CACHE_SUBDIR};

/// Errors that can occur while preparing cache storage.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No candidate directory accepted a probe write. This disables the
    /// whole backdrop subsystem.
    #[error("no writable cache directory found")]
    NoWritableDirectory,
}

/// Returns the root cache directory for the application.
///
/// # Returns
///
/// A `PathBuf` pointing to the platform cache directory joined with the
/// app name, or `/tmp/frost` if the cache directory is unavailable.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir().map_or_else(
        || std::env::temp_dir().join(APP_NAME),
        |cache| cache.join(APP_NAME),
    )
}

/// Returns a cache subdirectory for the given component.
#[must_use]
pub fn get_cache_subdir(subdir: &str) -> PathBuf { get_cache_dir().join(subdir) }

/// Checks whether a directory can actually be written to.
///
/// Creates the directory if needed, then probe-writes a throwaway file.
/// An existing directory on a read-only volume passes `exists()` checks
/// but fails here.
fn probe_writable(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe = tempfile::Builder::new().prefix(".probe-").tempfile_in(dir);

    match probe {
        Ok(mut file) => file.write_all(b"probe").is_ok(),
        Err(_) => false,
    }
}

/// Ensures a writable directory for backdrop artifacts exists.
///
/// Tries the user cache location first, then the system temp directory.
/// Each candidate is verified with a probe write before it is accepted.
///
/// # Errors
///
/// Returns [`CacheError::NoWritableDirectory`] if every candidate fails
/// the probe. Callers treat this as fatal for the subsystem.
pub fn ensure_backdrop_dir() -> Result<PathBuf, CacheError> {
    let candidates = [
        get_cache_subdir(BACKDROP_CACHE_SUBDIR),
        std::env::temp_dir().join(APP_NAME).join(BACKDROP_CACHE_SUBDIR),
    ];

    for candidate in candidates {
        if probe_writable(&candidate) {
            return Ok(candidate);
        }
        tracing::warn!(path = %candidate.display(), "cache candidate is not writable");
    }

    Err(CacheError::NoWritableDirectory)
}
