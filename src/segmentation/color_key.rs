use super::hsv::HsvImage;
use super::profile::ColorProfile;
use super::types::Mask;
use image::RgbImage;

/// Hue-range segmenter
///
/// Marks every pixel whose HSV value falls inside any of the profile's
/// ranges. Two-range profiles are combined with a plain boolean OR.
pub struct ColorKeySegmenter {
    profile: ColorProfile,
}

impl ColorKeySegmenter {
    pub fn new(profile: ColorProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ColorProfile {
        &self.profile
    }

    /// Classify a frame against the profile
    pub fn classify(&self, frame: &RgbImage) -> Mask {
        let _span = tracing::debug_span!("classify", profile = self.profile.name()).entered();

        let hsv = HsvImage::from_rgb(frame);
        let (width, height) = hsv.dimensions();

        Mask::from_fn(width, height, |x, y| self.profile.matches(hsv.get(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::hsv::Hsv;
    use crate::segmentation::profile::{lookup, HsvRange};
    use image::Rgb;

    #[test]
    fn test_classify_blue_block() {
        let segmenter = ColorKeySegmenter::new(lookup("Blue").unwrap());
        let frame = RgbImage::from_fn(6, 4, |x, _| {
            if x < 3 {
                Rgb([43, 43, 200])
            } else {
                Rgb([43, 200, 43])
            }
        });

        let mask = segmenter.classify(&frame);
        assert_eq!(mask.dimensions(), (6, 4));
        assert_eq!(mask.count(), 12);
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(mask.is_set(x, y), x < 3);
            }
        }
    }

    #[test]
    fn test_classify_red_both_ends_of_hue_axis() {
        let segmenter = ColorKeySegmenter::new(lookup("Red").unwrap());
        let mut frame = RgbImage::new(3, 1);
        // ~2 degrees, ~358 degrees, pure green
        frame.put_pixel(0, 0, Rgb([220, 8, 0]));
        frame.put_pixel(1, 0, Rgb([220, 0, 8]));
        frame.put_pixel(2, 0, Rgb([0, 220, 0]));

        let mask = segmenter.classify(&frame);
        assert!(mask.is_set(0, 0));
        assert!(mask.is_set(1, 0));
        assert!(!mask.is_set(2, 0));
        assert_eq!(segmenter.profile().name(), "Red");
    }

    #[test]
    fn test_classify_does_not_touch_frame() {
        let segmenter = ColorKeySegmenter::new(lookup("Green").unwrap());
        let frame = RgbImage::from_pixel(2, 2, Rgb([10, 200, 10]));
        let before = frame.clone();

        let mask = segmenter.classify(&frame);
        assert_eq!(mask.count(), 4);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_classify_custom_two_range_profile() {
        // yellow (H 20-30) or green (H 55-65), saturated and bright
        let profile = ColorProfile::new(
            "Highlighter",
            vec![
                HsvRange::new(Hsv::new(20, 100, 100), Hsv::new(30, 255, 255)),
                HsvRange::new(Hsv::new(55, 100, 100), Hsv::new(65, 255, 255)),
            ],
        )
        .unwrap();
        let segmenter = ColorKeySegmenter::new(profile);

        let row = [
            (Rgb([255, 255, 0]), true),    // H 30, first range
            (Rgb([0, 255, 0]), true),      // H 60, second range
            (Rgb([255, 128, 0]), false),   // H 15, below the first range
            (Rgb([0, 255, 255]), false),   // H 90, outside both
            (Rgb([255, 255, 200]), false), // yellow hue, too pale
            (Rgb([40, 40, 0]), false),     // yellow hue, too dark
        ];
        let frame = RgbImage::from_fn(row.len() as u32, 1, |x, _| row[x as usize].0);

        let mask = segmenter.classify(&frame);
        for (x, (_, expected)) in row.iter().enumerate() {
            assert_eq!(mask.is_set(x as u32, 0), *expected, "pixel {}", x);
        }
        assert_eq!(mask.count(), 2);
    }
}
