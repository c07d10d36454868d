//! Configuration types for Frost.
//!
//! This module provides all configuration types organized by domain.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

// Domain-specific configuration modules
pub mod backdrop;
pub mod color;
pub mod overlay;
pub mod panel;
pub mod root;

// Re-export all types for convenience

// Backdrop types
pub use backdrop::BackdropConfig;
// Color types
pub use color::{Rgb, parse_hex_color};
// Overlay types
pub use overlay::{ColorModeSetting, OverlayConfig};
// Panel types
pub use panel::PanelConfig;
// Root config types
pub use root::{ConfigError, FrostConfig, config_paths, load_config, load_config_from_path};
