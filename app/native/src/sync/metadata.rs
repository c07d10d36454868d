//! Persisted sync metadata.
//!
//! A small JSON record of the last successfully generated source identity
//! and display size. Read once at startup so an unchanged wallpaper can
//! reuse the on-disk artifacts without a forced first regeneration;
//! written after each successful regeneration. Absence or corruption is
//! non-fatal and simply behaves like a first run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Display pixel dimensions the artifacts were generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedMetadata {
    /// Identity of the source image the artifacts were generated from.
    #[serde(rename = "lastSourceImageIdentity")]
    pub last_source: String,
    /// Display size the artifacts were generated for.
    #[serde(rename = "lastDisplayDimensions")]
    pub last_display: Dimensions,
}

/// Reads and writes the metadata record.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Creates a store persisting at the given path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self { Self { path } }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Loads the persisted record, if present and parseable.
    #[must_use]
    pub fn load(&self) -> Option<PersistedMetadata> {
        let contents = fs::read_to_string(&self.path).ok()?;

        match serde_json::from_str(&contents) {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "discarding corrupt sync metadata"
                );
                None
            }
        }
    }

    /// Writes the record, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be written; callers log
    /// and continue, since metadata only optimizes the next cold start.
    pub fn store(&self, metadata: &PersistedMetadata) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&self.path, json)
    }
}
