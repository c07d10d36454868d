//! Scrim overlay configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::color::Rgb;

/// How the overlay decides between its light and dark behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeSetting {
    /// Always behave as if the host theme were light.
    ForcedLight,
    /// Always behave as if the host theme were dark.
    ForcedDark,
    /// Follow the theme reported by the windowing host.
    #[default]
    FollowHostTheme,
}

/// Configuration for the brightness-adaptive scrim overlay.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Whether the overlay is enabled.
    pub enabled: bool,

    /// Base scrim color, used when no mode-specific color is set.
    pub base: Rgb,

    /// Scrim color in light mode. Falls back to `base` when unset.
    pub light: Option<Rgb>,

    /// Scrim color in dark mode. Falls back to `base` when unset.
    pub dark: Option<Rgb>,

    /// Lower bound of the scrim opacity.
    pub min_alpha: f64,

    /// Upper bound of the scrim opacity.
    pub max_alpha: f64,

    /// Sampled brightness at or below which the scrim uses the strongest
    /// mode-appropriate extreme (0-255).
    pub low_threshold: u8,

    /// Sampled brightness at or above which the scrim uses the opposite
    /// extreme (0-255).
    pub high_threshold: u8,

    /// Light/dark mode selection.
    pub mode: ColorModeSetting,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base: Rgb::new(23, 23, 23),
            light: Some(Rgb::new(250, 250, 250)),
            dark: None,
            min_alpha: 0.2,
            max_alpha: 0.85,
            low_threshold: 40,
            high_threshold: 180,
            mode: ColorModeSetting::FollowHostTheme,
        }
    }
}

impl OverlayConfig {
    /// Returns whether the overlay is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool { self.enabled }

    /// Alpha bounds in ascending order, tolerating a swapped config.
    #[must_use]
    pub fn alpha_range(&self) -> (f64, f64) {
        let lo = self.min_alpha.clamp(0.0, 1.0);
        let hi = self.max_alpha.clamp(0.0, 1.0);
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    /// Brightness thresholds in ascending order, tolerating a swapped config.
    #[must_use]
    pub const fn thresholds(&self) -> (u8, u8) {
        if self.low_threshold <= self.high_threshold {
            (self.low_threshold, self.high_threshold)
        } else {
            (self.high_threshold, self.low_threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_follows_host() {
        let config = OverlayConfig::default();
        assert_eq!(config.mode, ColorModeSetting::FollowHostTheme);
    }

    #[test]
    fn test_mode_deserializes_kebab_case() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{ "mode": "forced-dark" }"#).unwrap();
        assert_eq!(config.mode, ColorModeSetting::ForcedDark);

        let config: OverlayConfig =
            serde_json::from_str(r#"{ "mode": "follow-host-theme" }"#).unwrap();
        assert_eq!(config.mode, ColorModeSetting::FollowHostTheme);
    }

    #[test]
    fn test_alpha_range_tolerates_swapped_bounds() {
        let config = OverlayConfig { min_alpha: 0.9, max_alpha: 0.1, ..Default::default() };
        assert_eq!(config.alpha_range(), (0.1, 0.9));
    }

    #[test]
    fn test_alpha_range_clamps_to_unit_interval() {
        let config = OverlayConfig { min_alpha: -2.0, max_alpha: 3.0, ..Default::default() };
        assert_eq!(config.alpha_range(), (0.0, 1.0));
    }

    #[test]
    fn test_thresholds_tolerate_swapped_bounds() {
        let config =
            OverlayConfig { low_threshold: 200, high_threshold: 50, ..Default::default() };
        assert_eq!(config.thresholds(), (50, 200));
    }
}
