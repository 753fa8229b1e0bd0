//! Inpainting masks.

use image::{GrayImage, Luma};

use crate::region::Region;

/// Mask value marking a pixel for inpainting.
pub const MASKED: u8 = 255;

/// Build a mask of `width x height` that is zero everywhere except `region`.
///
/// Parts of the region outside the mask extent are ignored.
#[must_use]
pub fn rectangle_mask(width: u32, height: u32, region: &Region) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if region.contains(x, y) {
            Luma([MASKED])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masked_count(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] != 0).count()
    }

    #[test]
    fn marks_exactly_the_region() {
        let region = Region::new(560, 510, 240, 90);
        let mask = rectangle_mask(800, 600, &region);

        assert_eq!(mask.dimensions(), (800, 600));
        assert_eq!(masked_count(&mask), 240 * 90);
        assert_eq!(mask.get_pixel(560, 510)[0], MASKED);
        assert_eq!(mask.get_pixel(799, 599)[0], MASKED);
        assert_eq!(mask.get_pixel(559, 599)[0], 0);
        assert_eq!(mask.get_pixel(799, 509)[0], 0);
    }

    #[test]
    fn empty_region_gives_empty_mask() {
        let mask = rectangle_mask(10, 10, &Region::new(10, 10, 0, 0));
        assert_eq!(masked_count(&mask), 0);
    }
}
