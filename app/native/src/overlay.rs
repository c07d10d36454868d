//! Scrim overlay color derivation.
//!
//! Maps a sampled extreme brightness to a scrim opacity, clamped to the
//! configured range, and formats the resulting `rgba()` color. In light
//! mode a darker worst-case patch produces a stronger scrim; in dark mode
//! a brighter worst-case patch does.

use crate::brightness::ColorMode;
use crate::config::{ColorModeSetting, OverlayConfig};
use crate::host::Theme;

/// Resolves the effective color mode from the configured selection and
/// the host theme.
#[must_use]
pub const fn resolve_mode(setting: ColorModeSetting, theme: Theme) -> ColorMode {
    match setting {
        ColorModeSetting::ForcedLight => ColorMode::Light,
        ColorModeSetting::ForcedDark => ColorMode::Dark,
        ColorModeSetting::FollowHostTheme => match theme {
            Theme::Light => ColorMode::Light,
            Theme::Dark => ColorMode::Dark,
        },
    }
}

/// Maps a sampled brightness to a scrim alpha.
///
/// At or below the low threshold the alpha is the mode-appropriate
/// extreme of the configured range (the strong end in light mode, the
/// weak end in dark mode); at or above the high threshold it is the
/// opposite extreme. Between the thresholds the alpha is interpolated
/// linearly. The result is always inside `[minAlpha, maxAlpha]`.
#[must_use]
pub fn alpha_for_brightness(brightness: u8, mode: ColorMode, config: &OverlayConfig) -> f64 {
    let (min_alpha, max_alpha) = config.alpha_range();
    let (low, high) = config.thresholds();

    let (start, end) = match mode {
        ColorMode::Light => (max_alpha, min_alpha),
        ColorMode::Dark => (min_alpha, max_alpha),
    };

    if brightness <= low || low == high {
        return if brightness <= low { start } else { end };
    }
    if brightness >= high {
        return end;
    }

    let t = f64::from(brightness - low) / f64::from(high - low);
    let alpha = t.mul_add(end - start, start);
    alpha.clamp(min_alpha, max_alpha)
}

/// Derives the full overlay color for a sampled brightness.
#[must_use]
pub fn overlay_color(brightness: u8, mode: ColorMode, config: &OverlayConfig) -> String {
    let rgb = match mode {
        ColorMode::Light => config.light.unwrap_or(config.base),
        ColorMode::Dark => config.dark.unwrap_or(config.base),
    };

    rgb.rgba(alpha_for_brightness(brightness, mode, config))
}

/// The currently applied overlay color. Derived, never persisted.
#[derive(Debug, Default)]
pub struct OverlayState {
    current: Option<String>,
}

impl OverlayState {
    /// Creates an empty overlay state.
    #[must_use]
    pub const fn new() -> Self { Self { current: None } }

    /// Returns the currently applied color, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> { self.current.as_deref() }

    /// Records a newly derived color.
    ///
    /// Returns `true` when the color actually changed and the surface
    /// needs to be updated.
    pub fn update(&mut self, color: String) -> bool {
        if self.current.as_deref() == Some(color.as_str()) {
            return false;
        }
        self.current = Some(color);
        true
    }
}
