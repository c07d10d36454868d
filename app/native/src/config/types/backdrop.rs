//! Backdrop (blurred wallpaper) configuration.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration for the blurred backdrop pipeline.
///
/// The pipeline renders two artifacts per wallpaper: a fast, heavily
/// reduced preview that is shown immediately, and a high-quality final
/// rendition at (a configurable fraction of) the display resolution.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BackdropConfig {
    /// Whether the backdrop subsystem is enabled.
    pub enabled: bool,

    /// Blur radius in pixels for the preview artifact. Rendered at the
    /// reduced preview scale, a larger radius smooths out the upscaling.
    pub preview_radius: u32,

    /// Blur radius in pixels for the final artifact.
    pub final_radius: u32,

    /// Resolution scale of the preview artifact relative to the display
    /// (0 < scale <= 1).
    pub preview_scale: f64,

    /// Resolution scale of the final artifact relative to the display
    /// (0 < scale <= 1). 1.0 renders at the full display resolution.
    pub final_scale: f64,

    /// JPEG quality of the preview artifact (1-100).
    pub preview_quality: u8,

    /// JPEG quality of the final artifact (1-100).
    pub final_quality: u8,

    /// Seconds between sync cycles after a successful cycle.
    pub poll_interval: u64,

    /// Seconds before retrying after a failed cycle.
    pub error_interval: u64,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preview_radius: 96,
            final_radius: 64,
            preview_scale: 0.25,
            final_scale: 1.0,
            preview_quality: 35,
            final_quality: 82,
            poll_interval: 10,
            error_interval: 30,
        }
    }
}

impl BackdropConfig {
    /// Returns whether the backdrop subsystem is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool { self.enabled }

    /// Interval between cycles after a success.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll_interval) }

    /// Interval before retrying after a failure.
    #[must_use]
    pub const fn error_interval(&self) -> Duration { Duration::from_secs(self.error_interval) }

    /// Preview scale, guarded against zero or negative values.
    #[must_use]
    pub fn preview_scale(&self) -> f64 {
        if self.preview_scale > 0.0 { self.preview_scale.min(1.0) } else { 0.25 }
    }

    /// Final scale, guarded against zero or negative values.
    #[must_use]
    pub fn final_scale(&self) -> f64 {
        if self.final_scale > 0.0 { self.final_scale.min(1.0) } else { 1.0 }
    }
}
