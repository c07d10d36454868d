//! Image processing for backdrop artifacts.
//!
//! Defines the blur transform boundary the sync pipeline talks to, plus
//! the default implementation built on the `image` crate: cover-resize to
//! the target dimensions, fast approximate Gaussian blur, JPEG encode at a
//! per-profile quality.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use thiserror::Error;

/// Errors that can occur during image processing.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Failed to read or decode the source image.
    #[error("Failed to read image: {0}")]
    ImageRead(String),
    /// Failed to encode or save the processed image.
    #[error("Failed to save processed image: {0}")]
    ImageWrite(String),
    /// The requested target dimensions are unusable.
    #[error("Invalid target size: {0}x{1}")]
    InvalidTarget(u32, u32),
    /// The transform terminated before producing a result.
    #[error("Transform interrupted")]
    Interrupted,
}

/// A single blur transform request.
///
/// Identical requests produce identical outputs, so a request that loses
/// the flow race can still leave a reusable artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Path of the source image.
    pub source: PathBuf,
    /// Path the artifact is written to (overwritten in place).
    pub output: PathBuf,
    /// Target width in pixels.
    pub target_width: u32,
    /// Target height in pixels.
    pub target_height: u32,
    /// Blur radius in pixels at the target resolution.
    pub blur_radius: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
}

/// The external blur transform the pipeline delegates to.
///
/// Implementations must be deterministic for identical requests and must
/// run to completion once started; cancellation happens by discarding the
/// result, never by interrupting the transform.
pub trait BlurTransform: Send + Sync {
    /// Renders `request.source` into `request.output`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessingError`] when the source cannot be read, the
    /// target size is degenerate, or the artifact cannot be written.
    fn transform(&self, request: &TransformRequest) -> Result<(), ProcessingError>;
}

/// Default processor backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProcessor;

impl ImageProcessor {
    /// Creates a new processor.
    #[must_use]
    pub const fn new() -> Self { Self }
}

impl BlurTransform for ImageProcessor {
    fn transform(&self, request: &TransformRequest) -> Result<(), ProcessingError> {
        if request.target_width == 0 || request.target_height == 0 {
            return Err(ProcessingError::InvalidTarget(
                request.target_width,
                request.target_height,
            ));
        }

        let img = ImageReader::open(&request.source)
            .map_err(|_| ProcessingError::ImageRead(request.source.display().to_string()))?
            .decode()
            .map_err(|_| ProcessingError::ImageRead(request.source.display().to_string()))?;

        let resized = resize_to_cover(&img, request.target_width, request.target_height);
        let blurred =
            if request.blur_radius > 0 { apply_fast_blur(&resized, request.blur_radius) } else { resized };

        let file = File::create(&request.output)
            .map_err(|_| ProcessingError::ImageWrite(request.output.display().to_string()))?;
        let writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(writer, request.quality.clamp(1, 100));
        blurred
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|_| ProcessingError::ImageWrite(request.output.display().to_string()))?;

        Ok(())
    }
}

/// Resizes an image to cover the target dimensions while maintaining
/// aspect ratio.
///
/// The image is scaled to fill the entire target, center-cropping edges if
/// necessary to avoid letterboxing.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn resize_to_cover(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
    let (img_width, img_height) = img.dimensions();

    let scale_x = f64::from(target_width) / f64::from(img_width);
    let scale_y = f64::from(target_height) / f64::from(img_height);
    let scale = scale_x.max(scale_y);

    let scaled_width = ((f64::from(img_width) * scale) as u32).max(target_width);
    let scaled_height = ((f64::from(img_height) * scale) as u32).max(target_height);

    // CatmullRom is good quality and much faster than Lanczos3
    let resized = img.resize_exact(
        scaled_width,
        scaled_height,
        image::imageops::FilterType::CatmullRom,
    );

    let crop_x = (scaled_width.saturating_sub(target_width)) / 2;
    let crop_y = (scaled_height.saturating_sub(target_height)) / 2;

    resized.crop_imm(crop_x, crop_y, target_width, target_height)
}

/// Applies a fast box-blur approximation of a Gaussian blur.
///
/// For larger radii the image is downscaled, blurred at the smaller size,
/// and upscaled again, which is far cheaper than a full-resolution
/// Gaussian pass and indistinguishable for a backdrop.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn apply_fast_blur(img: &DynamicImage, blur_radius: u32) -> DynamicImage {
    if blur_radius <= 5 {
        return img.blur(blur_radius as f32);
    }

    let (width, height) = img.dimensions();
    let scale_factor = 4u32;

    let small_width = (width / scale_factor).max(1);
    let small_height = (height / scale_factor).max(1);

    let small = img.resize_exact(small_width, small_height, image::imageops::FilterType::Triangle);

    let blur_at_scale = (blur_radius / scale_factor).max(1);
    let blurred_small = small.blur(blur_at_scale as f32);

    blurred_small.resize_exact(width, height, image::imageops::FilterType::Triangle)
}

/// Loads an artifact as an RGB pixel buffer for brightness sampling.
///
/// # Errors
///
/// Returns [`ProcessingError::ImageRead`] when the file cannot be opened
/// or decoded.
pub fn load_rgb(path: &Path) -> Result<RgbImage, ProcessingError> {
    let img = ImageReader::open(path)
        .map_err(|_| ProcessingError::ImageRead(path.display().to_string()))?
        .decode()
        .map_err(|_| ProcessingError::ImageRead(path.display().to_string()))?;
    Ok(img.to_rgb8())
}
