//! Error types for Frost.
//!
//! This module provides the unified top-level error type. Individual
//! subsystems define their own error enums and convert into `FrostError`
//! at the boundary where they are reported.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::processing::ProcessingError;

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum FrostError {
    /// Cache directory setup failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Image processing error.
    #[error("Image processing error: {0}")]
    Processing(#[from] ProcessingError),
    /// Panel bridge (IPC) error.
    #[error("IPC error: {0}")]
    Ipc(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err: FrostError = CacheError::NoWritableDirectory.into();
        let msg = err.to_string();
        assert!(msg.contains("Cache error"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: FrostError = io_err.into();
        assert!(matches!(err, FrostError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_ipc_error_display() {
        let err = FrostError::Ipc("socket already bound".to_string());
        let msg = err.to_string();
        assert!(msg.contains("IPC error"));
        assert!(msg.contains("socket already bound"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = FrostError::Ipc("test".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Ipc"));
    }
}
