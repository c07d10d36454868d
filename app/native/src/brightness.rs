//! Extreme-brightness sampling over backdrop artifacts.
//!
//! Computes the panel's content rectangle in display coordinates, maps it
//! into the reduced-resolution artifact, and scans a stride-sampled subset
//! of pixels for the worst-case luminance. The extreme (not the average)
//! is what keeps the scrim readable: a single bright or dark patch under
//! the panel would otherwise defeat the contrast.

use image::RgbImage;

use crate::geometry::Rect;

/// Sampling stride in pixels. Scanning every fourth pixel in both axes is
/// a 16x reduction and still catches any patch large enough to matter
/// under a panel.
const SAMPLE_STRIDE: u32 = 4;

/// The active color behavior of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Light UI: track the minimum luminance (darkest patch).
    Light,
    /// Dark UI: track the maximum luminance (brightest patch).
    Dark,
}

impl ColorMode {
    /// The brightness reported when no pixels could be sampled. Chosen so
    /// the resulting alpha is the strongest extreme for the mode.
    #[must_use]
    pub const fn fallback_brightness(self) -> u8 {
        match self {
            Self::Light => 0,
            Self::Dark => 255,
        }
    }
}

/// Rec. 601 luma of an RGB pixel, in `[0, 255]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// The viewport's content rectangle in display-local coordinates.
///
/// The margin is inset on all sides; the title bar is additionally
/// excluded at the top.
#[must_use]
pub fn content_rect(viewport: &Rect, display: &Rect, margin: f64, titlebar_offset: f64) -> Rect {
    Rect::new(
        viewport.x - display.x + margin,
        viewport.y - display.y + margin + titlebar_offset,
        viewport.width - 2.0 * margin,
        viewport.height - titlebar_offset - 2.0 * margin,
    )
}

/// Maps a display-local rectangle into artifact pixel bounds.
///
/// `scale` is the combined reduction ratio between display points and
/// artifact pixels (backing scale factor times the rendition scale the
/// artifact was generated at). The result is clamped to the artifact and
/// `None` when the clamped region has zero area.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn pixel_crop(region: &Rect, scale: f64, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    if !region.has_area() || scale <= 0.0 || width == 0 || height == 0 {
        return None;
    }

    let x0 = ((region.x * scale).floor().max(0.0) as u32).min(width);
    let y0 = ((region.y * scale).floor().max(0.0) as u32).min(height);
    let x1 = (((region.x + region.width) * scale).ceil().max(0.0) as u32).min(width);
    let y1 = (((region.y + region.height) * scale).ceil().max(0.0) as u32).min(height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some((x0, y0, x1, y1))
}

/// Scans the artifact region under the viewport for the extreme luminance
/// relevant to `mode`.
///
/// Returns the minimum sampled luminance in light mode and the maximum in
/// dark mode. A zero-area crop returns the mode-appropriate sentinel
/// instead of failing.
#[must_use]
pub fn sample_extreme_brightness(
    image: &RgbImage,
    viewport: &Rect,
    display: &Rect,
    margin: f64,
    titlebar_offset: f64,
    mode: ColorMode,
    scale: f64,
) -> u8 {
    let region = content_rect(viewport, display, margin, titlebar_offset);
    let (width, height) = image.dimensions();

    let Some((x0, y0, x1, y1)) = pixel_crop(&region, scale, width, height) else {
        return mode.fallback_brightness();
    };

    let mut extreme = match mode {
        ColorMode::Light => u8::MAX,
        ColorMode::Dark => u8::MIN,
    };

    let mut y = y0;
    while y < y1 {
        let mut x = x0;
        while x < x1 {
            let pixel = image.get_pixel(x, y);
            let luma = luminance(pixel[0], pixel[1], pixel[2]);
            extreme = match mode {
                ColorMode::Light => extreme.min(luma),
                ColorMode::Dark => extreme.max(luma),
            };
            x += SAMPLE_STRIDE;
        }
        y += SAMPLE_STRIDE;
    }

    extreme
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn uniform(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_fn(width, height, |_, _| Rgb([value, value, value]))
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        // Green dominates the luma weighting
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn test_content_rect_insets() {
        let viewport = Rect::new(100.0, 50.0, 400.0, 120.0);
        let display = Rect::new(0.0, 0.0, 1920.0, 1080.0);

        let region = content_rect(&viewport, &display, 10.0, 28.0);
        assert!((region.x - 110.0).abs() < f64::EPSILON);
        assert!((region.y - 88.0).abs() < f64::EPSILON);
        assert!((region.width - 380.0).abs() < f64::EPSILON);
        assert!((region.height - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pixel_crop_clamps_to_image() {
        let region = Rect::new(-50.0, -50.0, 5000.0, 5000.0);
        let crop = pixel_crop(&region, 1.0, 100, 80).unwrap();
        assert_eq!(crop, (0, 0, 100, 80));
    }

    #[test]
    fn test_pixel_crop_applies_scale() {
        let region = Rect::new(100.0, 40.0, 200.0, 80.0);
        let crop = pixel_crop(&region, 0.25, 1000, 1000).unwrap();
        assert_eq!(crop, (25, 10, 75, 30));
    }

    #[test]
    fn test_pixel_crop_zero_area_is_none() {
        let region = Rect::new(10.0, 10.0, 0.0, 50.0);
        assert!(pixel_crop(&region, 1.0, 100, 100).is_none());

        // Region entirely outside the image
        let region = Rect::new(500.0, 500.0, 50.0, 50.0);
        assert!(pixel_crop(&region, 1.0, 100, 100).is_none());
    }

    #[test]
    fn test_sample_tracks_minimum_in_light_mode() {
        let mut image = uniform(64, 64, 200);
        // One dark patch, larger than the stride
        for y in 20..30 {
            for x in 20..30 {
                image.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }

        let viewport = Rect::new(0.0, 0.0, 64.0, 64.0);
        let display = Rect::new(0.0, 0.0, 64.0, 64.0);

        let result =
            sample_extreme_brightness(&image, &viewport, &display, 0.0, 0.0, ColorMode::Light, 1.0);
        assert_eq!(result, 10);
    }

    #[test]
    fn test_sample_tracks_maximum_in_dark_mode() {
        let mut image = uniform(64, 64, 30);
        for y in 40..50 {
            for x in 8..18 {
                image.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }

        let viewport = Rect::new(0.0, 0.0, 64.0, 64.0);
        let display = Rect::new(0.0, 0.0, 64.0, 64.0);

        let result =
            sample_extreme_brightness(&image, &viewport, &display, 0.0, 0.0, ColorMode::Dark, 1.0);
        assert_eq!(result, 250);
    }

    #[test]
    fn test_sample_ignores_pixels_outside_viewport() {
        let mut image = uniform(64, 64, 200);
        // Dark patch outside the sampled half
        for y in 0..64 {
            for x in 40..64 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let viewport = Rect::new(0.0, 0.0, 32.0, 64.0);
        let display = Rect::new(0.0, 0.0, 64.0, 64.0);

        let result =
            sample_extreme_brightness(&image, &viewport, &display, 0.0, 0.0, ColorMode::Light, 1.0);
        assert_eq!(result, 200);
    }

    #[test]
    fn test_sample_zero_area_returns_mode_sentinel() {
        let image = uniform(16, 16, 128);
        let viewport = Rect::new(0.0, 0.0, 0.0, 0.0);
        let display = Rect::new(0.0, 0.0, 16.0, 16.0);

        let light =
            sample_extreme_brightness(&image, &viewport, &display, 0.0, 0.0, ColorMode::Light, 1.0);
        let dark =
            sample_extreme_brightness(&image, &viewport, &display, 0.0, 0.0, ColorMode::Dark, 1.0);
        assert_eq!(light, 0);
        assert_eq!(dark, 255);
    }

    #[test]
    fn test_sample_scales_viewport_into_reduced_artifact() {
        // 32x32 artifact standing in for a 128x128 display (scale 0.25)
        let mut image = uniform(32, 32, 220);
        for y in 0..8 {
            for x in 0..8 {
                image.put_pixel(x, y, Rgb([5, 5, 5]));
            }
        }

        // Viewport over the top-left quarter of the display
        let viewport = Rect::new(0.0, 0.0, 32.0, 32.0);
        let display = Rect::new(0.0, 0.0, 128.0, 128.0);

        let result = sample_extreme_brightness(
            &image,
            &viewport,
            &display,
            0.0,
            0.0,
            ColorMode::Light,
            0.25,
        );
        assert_eq!(result, 5);
    }
}
