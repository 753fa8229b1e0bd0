//! Watermark region geometry.
//!
//! Corner watermarks are located by proportion rather than by detection: the
//! region is a fixed fraction of the image, flush with the bottom-right corner.

use crate::error::{Error, Result};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Create a region from its top-left corner and size.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom-right region sized by integer percentages of the image (1..=100).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a percentage is 0 or above 100, or the
    /// image is empty.
    pub fn from_percent(
        width: u32,
        height: u32,
        width_percent: u32,
        height_percent: u32,
    ) -> Result<Self> {
        compute_region(
            width,
            height,
            f64::from(width_percent) / 100.0,
            f64::from(height_percent) / 100.0,
        )
    }

    /// Exclusive right edge, `x + width`.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge, `y + height`.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the region covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the pixel `(px, py)` lies inside the region.
    #[must_use]
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Validate a caller-supplied region against image bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the region has zero width or height,
    /// or extends past the image edge.
    pub fn check_within(&self, width: u32, height: u32) -> Result<()> {
        if self.is_empty() {
            return Err(Error::invalid(format!(
                "region {}x{} at ({}, {}) has no area",
                self.width, self.height, self.x, self.y
            )));
        }
        self.check_bounds(width, height)
    }

    /// Like [`check_within`](Self::check_within) but accepts empty regions.
    pub(crate) fn check_bounds(&self, width: u32, height: u32) -> Result<()> {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        match (right, bottom) {
            (Some(r), Some(b)) if r <= width && b <= height => Ok(()),
            _ => Err(Error::invalid(format!(
                "region {}x{} at ({}, {}) exceeds image bounds {width}x{height}",
                self.width, self.height, self.x, self.y
            ))),
        }
    }
}

/// Compute the bottom-right watermark region for an image.
///
/// `region_width = floor(width * width_ratio)`, likewise for height, anchored so
/// the region touches the right and bottom edges.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if either ratio is outside `(0, 1]` or the
/// image has a zero dimension.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_region(
    width: u32,
    height: u32,
    width_ratio: f64,
    height_ratio: f64,
) -> Result<Region> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    for (name, ratio) in [("width", width_ratio), ("height", height_ratio)] {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::invalid(format!(
                "{name} ratio must be in (0, 1], got {ratio}"
            )));
        }
    }

    // ratio <= 1, so the products never exceed the source dimension
    let region_width = (f64::from(width) * width_ratio).floor() as u32;
    let region_height = (f64::from(height) * height_ratio).floor() as u32;

    Ok(Region {
        x: width - region_width,
        y: height - region_height,
        width: region_width,
        height: region_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_region_matches_default_watermark_corner() {
        let r = Region::from_percent(800, 600, 30, 15).unwrap();
        assert_eq!(r, Region::new(560, 510, 240, 90));
        assert_eq!(r.right(), 800);
        assert_eq!(r.bottom(), 600);
    }

    #[test]
    fn region_is_flush_and_contained_for_many_sizes() {
        for &(w, h) in &[(1, 1), (7, 3), (512, 512), (1920, 1080), (33, 4097)] {
            for &ratio in &[0.01, 0.15, 0.16, 0.5, 0.999, 1.0] {
                let r = compute_region(w, h, ratio, ratio).unwrap();
                assert_eq!(r.right(), w, "{w}x{h} @ {ratio}");
                assert_eq!(r.bottom(), h, "{w}x{h} @ {ratio}");
                assert!(r.width <= w && r.height <= h);
            }
        }
    }

    #[test]
    fn model_grid_regions() {
        assert_eq!(
            compute_region(512, 512, 0.15, 0.15).unwrap(),
            Region::new(436, 436, 76, 76)
        );
        assert_eq!(
            compute_region(512, 512, 0.16, 0.16).unwrap(),
            Region::new(431, 431, 81, 81)
        );
    }

    #[test]
    fn full_ratio_covers_whole_image() {
        let r = compute_region(40, 30, 1.0, 1.0).unwrap();
        assert_eq!(r, Region::new(0, 0, 40, 30));
    }

    #[test]
    fn rejects_out_of_range_ratios() {
        for bad in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compute_region(100, 100, bad, 0.5),
                Err(Error::InvalidArgument(_))
            ));
            assert!(matches!(
                compute_region(100, 100, 0.5, bad),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(Region::from_percent(100, 100, 0, 15).is_err());
        assert!(Region::from_percent(100, 100, 30, 101).is_err());
    }

    #[test]
    fn rejects_empty_image() {
        assert!(compute_region(0, 10, 0.5, 0.5).is_err());
        assert!(compute_region(10, 0, 0.5, 0.5).is_err());
    }

    #[test]
    fn check_within_validates_custom_regions() {
        assert!(Region::new(10, 10, 20, 20).check_within(30, 30).is_ok());
        assert!(Region::new(10, 10, 21, 20).check_within(30, 30).is_err());
        assert!(Region::new(0, 0, 0, 5).check_within(30, 30).is_err());
        assert!(Region::new(u32::MAX, 0, 2, 2).check_within(30, 30).is_err());
        // corner regions may legitimately round down to nothing
        assert!(Region::new(30, 30, 0, 0).check_bounds(30, 30).is_ok());
    }

    #[test]
    fn contains_uses_half_open_bounds() {
        let r = Region::new(2, 3, 4, 5);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 7));
        assert!(!r.contains(5, 8));
        assert!(!r.contains(1, 3));
    }
}
