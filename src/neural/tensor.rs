//! Tensor conversion around the inpainting model.

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{s, Array4, Axis};

use crate::error::{Error, Result};
use crate::region::Region;

/// Side of the top-left patch sampled to detect the output value range.
const RANGE_SAMPLE: usize = 100;

/// Sampled magnitudes at or below this are treated as normalized `[0, 1]` output.
const NORMALIZED_MAX: f32 = 2.0;

/// Resize `image` to `size x size` and lay it out as a `(1, 3, size, size)`
/// tensor with values in `[0, 1]`.
#[must_use]
pub fn image_tensor(image: &DynamicImage, size: u32) -> Array4<f32> {
    let resized = image
        .resize_exact(size, size, FilterType::Lanczos3)
        .to_rgb8();
    let side = size as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, px) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = f32::from(px[c]) / 255.0;
        }
    }
    tensor
}

/// `(1, 1, size, size)` mask tensor, 1.0 inside `region` and 0.0 elsewhere.
#[must_use]
pub fn mask_tensor(size: u32, region: &Region) -> Array4<f32> {
    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 1, side, side));
    if !region.is_empty() {
        tensor
            .slice_mut(s![
                0,
                0,
                region.y as usize..region.bottom() as usize,
                region.x as usize..region.right() as usize
            ])
            .fill(1.0);
    }
    tensor
}

/// Whether a `(channels, height, width)` output looks normalized to `[0, 1]`.
///
/// Only the top-left 100x100 patch is inspected; a bright patch in an otherwise
/// normalized output (or the reverse) is misclassified.
fn looks_normalized(chw: &ndarray::ArrayView3<'_, f32>) -> bool {
    let (_, h, w) = chw.dim();
    let patch = chw.slice(s![.., ..h.min(RANGE_SAMPLE), ..w.min(RANGE_SAMPLE)]);
    let max_abs = patch.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    max_abs <= NORMALIZED_MAX
}

/// Convert a `(1, 3, H, W)` model output into an RGB image.
///
/// Outputs whose sampled magnitude is at most 2.0 are scaled by 255; values
/// are then clamped to `[0, 255]` and truncated.
///
/// # Errors
///
/// Returns [`Error::Inference`] if the output is not a batch of 3-channel images.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn output_to_image(output: &Array4<f32>) -> Result<RgbImage> {
    let (batch, channels, height, width) = output.dim();
    if batch == 0 || channels != 3 {
        return Err(Error::inference(format!(
            "expected model output of shape (1, 3, H, W), got {:?}",
            output.shape()
        )));
    }

    let chw = output.index_axis(Axis(0), 0);
    let scale = if looks_normalized(&chw) { 255.0 } else { 1.0 };
    log::debug!("model output scale factor {scale}");

    let to_u8 = |v: f32| (v * scale).clamp(0.0, 255.0) as u8;
    let width = u32::try_from(width).map_err(|_| Error::inference("output width overflows u32"))?;
    let height =
        u32::try_from(height).map_err(|_| Error::inference("output height overflows u32"))?;

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            to_u8(chw[[0, y, x]]),
            to_u8(chw[[1, y, x]]),
            to_u8(chw[[2, y, x]]),
        ])
    }))
}
