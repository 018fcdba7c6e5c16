use crate::error::{CloakError, Result};
use crate::segmentation::Mask;
use image::{Rgb, RgbImage};

/// Substitute background pixels wherever the mask is set.
///
/// The background contributes only under the mask and the live frame only
/// under its complement; the two are summed with per-channel saturation.
/// Always returns a fresh buffer.
pub fn blend(background: &RgbImage, live: &RgbImage, mask: &Mask) -> Result<RgbImage> {
    let _span = tracing::debug_span!("blend").entered();

    let expected = live.dimensions();
    for actual in [background.dimensions(), mask.dimensions()] {
        if actual != expected {
            return Err(CloakError::DimensionMismatch { expected, actual });
        }
    }

    let (width, height) = expected;
    let output = RgbImage::from_fn(width, height, |x, y| {
        let on = mask.is_set(x, y);
        let keep_background = if on { *background.get_pixel(x, y) } else { Rgb([0, 0, 0]) };
        let keep_live = if on { Rgb([0, 0, 0]) } else { *live.get_pixel(x, y) };

        Rgb([
            keep_background[0].saturating_add(keep_live[0]),
            keep_background[1].saturating_add(keep_live[1]),
            keep_background[2].saturating_add(keep_live[2]),
        ])
    });

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition() {
        let background = RgbImage::from_fn(8, 6, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 7]));
        let live = RgbImage::from_fn(8, 6, |x, y| Rgb([200, x as u8 + y as u8, 100]));
        let mask = Mask::from_fn(8, 6, |x, y| (x + y) % 3 == 0);

        let output = blend(&background, &live, &mask).unwrap();
        for (x, y, pixel) in output.enumerate_pixels() {
            if mask.is_set(x, y) {
                assert_eq!(pixel, background.get_pixel(x, y));
            } else {
                assert_eq!(pixel, live.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_empty_and_full_masks() {
        let background = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let live = RgbImage::from_pixel(4, 4, Rgb([250, 251, 252]));

        let none = blend(&background, &live, &Mask::new(4, 4)).unwrap();
        assert_eq!(none, live);

        let all = blend(&background, &live, &Mask::from_fn(4, 4, |_, _| true)).unwrap();
        assert_eq!(all, background);
    }

    #[test]
    fn test_dimension_mismatch() {
        let background = RgbImage::new(4, 4);
        let live = RgbImage::new(4, 4);
        let mask = Mask::new(5, 4);

        let err = blend(&background, &live, &mask).unwrap_err();
        assert!(matches!(
            err,
            CloakError::DimensionMismatch {
                expected: (4, 4),
                actual: (5, 4)
            }
        ));

        let err = blend(&RgbImage::new(2, 2), &live, &Mask::new(4, 4)).unwrap_err();
        assert!(matches!(err, CloakError::DimensionMismatch { .. }));
    }
}
