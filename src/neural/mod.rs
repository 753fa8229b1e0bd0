//! Neural watermark removal with a LaMa-style inpainting model.
//!
//! The whole image is squeezed into the model's fixed square input, the
//! bottom-right corner is masked and inpainted, and only that corner of the
//! result is scaled back up and pasted over the original. Content outside the
//! corner never goes through the lossy resize round-trip.
//!
//! ```no_run
//! # #[cfg(feature = "onnx")]
//! # fn main() -> watermark_inpaint::Result<()> {
//! use watermark_inpaint::neural::{remove_watermark_neural, LamaSession};
//!
//! let model = LamaSession::load(LamaSession::default_model_path())?;
//! let img = image::open("photo.jpg").expect("readable image");
//! let cleaned = remove_watermark_neural(&img, &model)?;
//! cleaned.save("cleaned.png").expect("writable output");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "onnx"))]
//! # fn main() {}
//! ```

mod compose;
mod model;
mod tensor;

pub use compose::compose;
#[cfg(feature = "onnx")]
pub use model::LamaSession;
pub use model::InpaintModel;
pub use tensor::{image_tensor, mask_tensor, output_to_image};

use image::DynamicImage;
use ndarray::Array4;

use crate::engine::WatermarkRemover;
use crate::error::{Error, Result};
use crate::region::compute_region;

/// Side of the square model input.
pub const MODEL_INPUT_SIZE: u32 = 512;
/// Corner ratio masked for inference.
pub const MASK_RATIO: f64 = 0.15;
/// Corner ratio composited back, slightly larger than the mask to hide seams.
pub const BLEND_RATIO: f64 = 0.16;

/// Geometry of the neural pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuralOptions {
    /// Side of the square model input in pixels.
    pub input_size: u32,
    /// Bottom-right ratio (of both width and height) masked for inference.
    pub mask_ratio: f64,
    /// Bottom-right ratio pasted back into the original.
    pub blend_ratio: f64,
}

impl Default for NeuralOptions {
    fn default() -> Self {
        Self {
            input_size: MODEL_INPUT_SIZE,
            mask_ratio: MASK_RATIO,
            blend_ratio: BLEND_RATIO,
        }
    }
}

/// Build the `(image, mask)` input tensors for `image`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for a zero input size or out-of-range mask
/// ratio.
pub fn preprocess(
    image: &DynamicImage,
    options: &NeuralOptions,
) -> Result<(Array4<f32>, Array4<f32>)> {
    let size = options.input_size;
    let region = compute_region(size, size, options.mask_ratio, options.mask_ratio)?;
    log::debug!("mask region on {size}x{size} model grid: {region:?}");
    Ok((image_tensor(image, size), mask_tensor(size, &region)))
}

/// Remove the corner watermark from `image` with the default geometry.
///
/// # Errors
///
/// Propagates [`Error::Inference`] from the model, and reports an output of the
/// wrong shape as [`Error::Inference`].
pub fn remove_watermark_neural<M>(image: &DynamicImage, model: &M) -> Result<DynamicImage>
where
    M: InpaintModel + ?Sized,
{
    remove_watermark_neural_with(image, model, &NeuralOptions::default())
}

/// Remove the corner watermark from `image` with explicit geometry.
///
/// # Errors
///
/// See [`remove_watermark_neural`]; also [`Error::InvalidArgument`] for invalid
/// options.
pub fn remove_watermark_neural_with<M>(
    image: &DynamicImage,
    model: &M,
    options: &NeuralOptions,
) -> Result<DynamicImage>
where
    M: InpaintModel + ?Sized,
{
    let (image_tensor, mask_tensor) = preprocess(image, options)?;
    let output = model.infer(image_tensor, mask_tensor)?;

    let side = options.input_size as usize;
    if output.dim() != (1, 3, side, side) {
        return Err(Error::inference(format!(
            "expected model output of shape (1, 3, {side}, {side}), got {:?}",
            output.shape()
        )));
    }

    let processed = output_to_image(&output)?;
    compose(image, &processed, options)
}

/// Neural removal bound to a loaded model, usable with the file pipeline.
#[derive(Debug)]
pub struct NeuralRemover<'m, M: ?Sized> {
    model: &'m M,
    options: NeuralOptions,
}

impl<'m, M: InpaintModel + ?Sized> NeuralRemover<'m, M> {
    /// Bind `model` with the default geometry.
    #[must_use]
    pub fn new(model: &'m M) -> Self {
        Self::with_options(model, NeuralOptions::default())
    }

    /// Bind `model` with explicit geometry.
    #[must_use]
    pub fn with_options(model: &'m M, options: NeuralOptions) -> Self {
        Self { model, options }
    }

    /// The geometry in use.
    #[must_use]
    pub fn options(&self) -> &NeuralOptions {
        &self.options
    }
}

impl<M: InpaintModel + ?Sized> WatermarkRemover for NeuralRemover<'_, M> {
    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
        remove_watermark_neural_with(image, self.model, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};
    use std::sync::Mutex;

    /// Returns a constant output and records the mask it was given.
    struct ConstantModel {
        value: f32,
        masked: Mutex<Option<f32>>,
    }

    impl ConstantModel {
        fn new(value: f32) -> Self {
            Self {
                value,
                masked: Mutex::new(None),
            }
        }
    }

    impl InpaintModel for ConstantModel {
        fn infer(&self, image: Array4<f32>, mask: Array4<f32>) -> Result<Array4<f32>> {
            *self.masked.lock().unwrap() = Some(mask.sum());
            Ok(Array4::from_elem(image.dim(), self.value))
        }
    }

    struct WrongShape;

    impl InpaintModel for WrongShape {
        fn infer(&self, _image: Array4<f32>, _mask: Array4<f32>) -> Result<Array4<f32>> {
            Ok(Array4::zeros((1, 3, 256, 256)))
        }
    }

    struct Failing;

    impl InpaintModel for Failing {
        fn infer(&self, _image: Array4<f32>, _mask: Array4<f32>) -> Result<Array4<f32>> {
            Err(Error::inference("input 'mask' has wrong rank"))
        }
    }

    fn photo(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            Rgb([(x % 200) as u8, (y % 150) as u8, 60])
        }))
    }

    #[test]
    fn only_blend_corner_is_modified() {
        let img = photo(800, 600);
        let model = ConstantModel::new(1.0);
        let out = remove_watermark_neural(&img, &model).unwrap();

        let corner = compute_region(800, 600, BLEND_RATIO, BLEND_RATIO).unwrap();
        assert_eq!(out.dimensions(), (800, 600));
        for (x, y, px) in img.pixels() {
            let got = out.get_pixel(x, y);
            if corner.contains(x, y) {
                assert_eq!(got.0, [255, 255, 255, 255]);
            } else {
                assert_eq!(px, got);
            }
        }
    }

    #[test]
    fn model_sees_tight_mask() {
        let model = ConstantModel::new(0.0);
        remove_watermark_neural(&photo(300, 200), &model).unwrap();
        let masked = model.masked.lock().unwrap().expect("model was called");
        assert!((masked - 76.0 * 76.0).abs() < 0.5);
    }

    #[test]
    fn wrong_output_shape_is_inference_error() {
        let err = remove_watermark_neural(&photo(64, 64), &WrongShape).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn backend_errors_propagate_unchanged() {
        let err = remove_watermark_neural(&photo(64, 64), &Failing).unwrap_err();
        assert!(err.to_string().contains("wrong rank"));
    }

    #[test]
    fn custom_geometry_is_honoured() {
        let options = NeuralOptions {
            input_size: 64,
            mask_ratio: 0.25,
            blend_ratio: 0.5,
        };
        let (image, mask) = preprocess(&photo(100, 100), &options).unwrap();
        assert_eq!(image.dim(), (1, 3, 64, 64));
        assert!((mask.sum() - 256.0).abs() < 0.5);

        let model = ConstantModel::new(1.0);
        let remover = NeuralRemover::with_options(&model, options);
        let out = remover.remove(&photo(100, 100)).unwrap();
        assert_eq!(out.get_pixel(50, 50).0, [255, 255, 255, 255]);
        assert_ne!(out.get_pixel(49, 49).0, [255, 255, 255, 255]);
    }

    #[test]
    fn invalid_ratio_is_rejected_before_inference() {
        let options = NeuralOptions {
            mask_ratio: 0.0,
            ..NeuralOptions::default()
        };
        let model = ConstantModel::new(1.0);
        assert!(matches!(
            remove_watermark_neural_with(&photo(64, 64), &model, &options),
            Err(Error::InvalidArgument(_))
        ));
        assert!(model.masked.lock().unwrap().is_none());
    }
}
