//! Classical (non-learned) watermark removal.
//!
//! Masks a rectangle and fills it with [`inpaint`](crate::inpaint::inpaint).
//! The rectangle is either a percentage-sized bottom-right corner or a
//! caller-supplied region.

use image::DynamicImage;

use crate::engine::WatermarkRemover;
use crate::error::Result;
use crate::inpaint::{inpaint, InpaintMethod, DEFAULT_RADIUS};
use crate::mask::rectangle_mask;
use crate::region::Region;

/// Default corner width, as a percentage of the image width.
pub const DEFAULT_WIDTH_PERCENT: u32 = 30;
/// Default corner height, as a percentage of the image height.
pub const DEFAULT_HEIGHT_PERCENT: u32 = 15;

/// Which part of the image to inpaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Bottom-right corner sized by percentages of the image.
    Corner {
        /// Percentage of the image width (1..=100).
        width_percent: u32,
        /// Percentage of the image height (1..=100).
        height_percent: u32,
    },
    /// Explicit rectangle in pixel coordinates.
    Custom(Region),
}

impl Default for Target {
    fn default() -> Self {
        Self::Corner {
            width_percent: DEFAULT_WIDTH_PERCENT,
            height_percent: DEFAULT_HEIGHT_PERCENT,
        }
    }
}

impl Target {
    /// Resolve to a concrete region for an image of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) for
    /// percentages outside 1..=100, or custom regions that are empty or out of
    /// bounds.
    pub fn resolve(&self, width: u32, height: u32) -> Result<Region> {
        match *self {
            Self::Corner {
                width_percent,
                height_percent,
            } => Region::from_percent(width, height, width_percent, height_percent),
            Self::Custom(region) => {
                region.check_within(width, height)?;
                Ok(region)
            }
        }
    }
}

/// Inpaint `region` of `image`.
///
/// RGBA images keep their alpha channel (synthesized inside the region); every
/// other layout is processed as RGB. Inputs are converted to 8 bits per
/// channel first, so grayscale and 16-bit images come back as `Rgb8` (or
/// `Rgba8` when they carry alpha). The output has the input's dimensions and
/// matches the 8-bit conversion of the input outside `region`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
/// region exceeds the image or `radius` is zero.
pub fn inpaint_classical(
    image: &DynamicImage,
    region: &Region,
    method: InpaintMethod,
    radius: u32,
) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    region.check_bounds(width, height)?;
    let mask = rectangle_mask(width, height, region);

    log::debug!(
        "classical inpaint of {}x{} at ({}, {}) in {width}x{height} image",
        region.width,
        region.height,
        region.x,
        region.y
    );

    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        Ok(DynamicImage::ImageRgba8(inpaint(
            &rgba, &mask, radius, method,
        )?))
    } else {
        let rgb = image.to_rgb8();
        Ok(DynamicImage::ImageRgb8(inpaint(&rgb, &mask, radius, method)?))
    }
}

/// Inpaint the bottom-right corner sized by percentages of the image.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) for
/// percentages outside 1..=100.
pub fn remove_corner_watermark(
    image: &DynamicImage,
    width_percent: u32,
    height_percent: u32,
    method: InpaintMethod,
) -> Result<DynamicImage> {
    let region = Region::from_percent(image.width(), image.height(), width_percent, height_percent)?;
    inpaint_classical(image, &region, method, DEFAULT_RADIUS)
}

/// Inpaint a caller-specified rectangle.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
/// region is empty or extends past the image.
pub fn remove_region_watermark(
    image: &DynamicImage,
    region: Region,
    method: InpaintMethod,
) -> Result<DynamicImage> {
    region.check_within(image.width(), image.height())?;
    inpaint_classical(image, &region, method, DEFAULT_RADIUS)
}

/// Classical removal configuration, usable with the file pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalRemover {
    /// Region to inpaint.
    pub target: Target,
    /// Synthesis method.
    pub method: InpaintMethod,
    /// Neighbourhood radius in pixels.
    pub radius: u32,
}

impl Default for ClassicalRemover {
    fn default() -> Self {
        Self {
            target: Target::default(),
            method: InpaintMethod::default(),
            radius: DEFAULT_RADIUS,
        }
    }
}

impl WatermarkRemover for ClassicalRemover {
    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let region = self.target.resolve(image.width(), image.height())?;
        inpaint_classical(image, &region, self.method, self.radius)
    }
}
