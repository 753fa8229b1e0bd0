//! Paste the model's low-resolution corner back into the full-resolution image.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use super::NeuralOptions;
use crate::error::{Error, Result};
use crate::region::compute_region;

/// Compose the final image from the original and the model's square output.
///
/// The `blend_ratio` corner of `processed` is upscaled to the `blend_ratio`
/// corner of `original` and pasted there. Everything outside that corner is
/// copied from `original` unchanged. The slightly larger blend ratio (compared
/// to the mask ratio) hides the seam around the inpainted area.
///
/// The result is always 8 bits per channel: `Rgba8` when `original` has an
/// alpha channel, `Rgb8` otherwise. Grayscale and 16-bit originals are
/// converted, including outside the corner.
///
/// # Errors
///
/// Returns [`Error::Internal`] if `processed` is not `input_size` square, and
/// [`Error::InvalidArgument`] for an out-of-range blend ratio.
pub fn compose(
    original: &DynamicImage,
    processed: &RgbImage,
    options: &NeuralOptions,
) -> Result<DynamicImage> {
    let size = options.input_size;
    if processed.dimensions() != (size, size) {
        return Err(Error::internal(format!(
            "processed image is {}x{}, expected {size}x{size}",
            processed.width(),
            processed.height()
        )));
    }

    let ratio = options.blend_ratio;
    let target = compute_region(original.width(), original.height(), ratio, ratio)?;
    let source = compute_region(size, size, ratio, ratio)?;
    log::debug!("compositing {source:?} of model output onto {target:?}");

    if target.is_empty() || source.is_empty() {
        return Ok(original.clone());
    }

    let patch = imageops::crop_imm(processed, source.x, source.y, source.width, source.height)
        .to_image();
    let patch = imageops::resize(&patch, target.width, target.height, FilterType::Lanczos3);
    let (x, y) = (i64::from(target.x), i64::from(target.y));

    if original.color().has_alpha() {
        let mut canvas = original.to_rgba8();
        let patch = DynamicImage::ImageRgb8(patch).to_rgba8();
        imageops::replace(&mut canvas, &patch, x, y);
        Ok(DynamicImage::ImageRgba8(canvas))
    } else {
        let mut canvas = original.to_rgb8();
        imageops::replace(&mut canvas, &patch, x, y);
        Ok(DynamicImage::ImageRgb8(canvas))
    }
}
