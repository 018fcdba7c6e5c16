use image::{Rgb, RgbImage};

/// Hue/saturation/value triple in the 8-bit convention:
/// hue in [0, 180) (degrees halved), saturation and value in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert one RGB pixel.
    ///
    /// Integer arithmetic throughout; halves round up, matching the usual
    /// 8-bit HSV convention where `S = (255 * delta + max / 2) / max`.
    pub fn from_rgb(pixel: &Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0.map(i32::from);
        let max = r.max(g).max(b);
        let delta = max - r.min(g).min(b);

        let v = max as u8;
        if delta == 0 {
            return Self { h: 0, s: 0, v };
        }
        let s = ((255 * delta + max / 2) / max) as u8;

        // hue in sixths of the circle, scaled by delta: red 0, green 2, blue 4
        let sextant = if max == r {
            g - b
        } else if max == g {
            b - r + 2 * delta
        } else {
            r - g + 4 * delta
        };

        // 30 half-degrees per sextant; 180 wraps back to 0
        let h = (60 * sextant + delta).div_euclid(2 * delta).rem_euclid(180) as u8;

        Self { h, s, v }
    }
}

/// Transient HSV copy of a frame, row-major
pub struct HsvImage {
    width: u32,
    height: u32,
    pixels: Vec<Hsv>,
}

impl HsvImage {
    pub fn from_rgb(frame: &RgbImage) -> Self {
        let _span = tracing::debug_span!("rgb_to_hsv").entered();

        let (width, height) = frame.dimensions();
        let pixels = frame.pixels().map(Hsv::from_rgb).collect();

        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Hsv {
        self.pixels[(y * self.width + x) as usize]
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primaries() {
        assert_eq!(Hsv::from_rgb(&Rgb([255, 0, 0])), Hsv::new(0, 255, 255));
        assert_eq!(Hsv::from_rgb(&Rgb([0, 255, 0])), Hsv::new(60, 255, 255));
        assert_eq!(Hsv::from_rgb(&Rgb([0, 0, 255])), Hsv::new(120, 255, 255));
    }

    #[test]
    fn test_greys_have_no_hue_or_saturation() {
        assert_eq!(Hsv::from_rgb(&Rgb([0, 0, 0])), Hsv::new(0, 0, 0));
        assert_eq!(Hsv::from_rgb(&Rgb([128, 128, 128])), Hsv::new(0, 0, 128));
        assert_eq!(Hsv::from_rgb(&Rgb([255, 255, 255])), Hsv::new(0, 0, 255));
    }

    #[test]
    fn test_partial_saturation() {
        // 157 / 200 * 255 = 200.2
        assert_eq!(Hsv::from_rgb(&Rgb([43, 43, 200])), Hsv::new(120, 200, 200));
        assert_eq!(Hsv::from_rgb(&Rgb([43, 200, 43])), Hsv::new(60, 200, 200));
    }

    #[test]
    fn test_half_steps_round_up() {
        // 255 / 2 = 127.5
        assert_eq!(Hsv::from_rgb(&Rgb([2, 1, 1])), Hsv::new(0, 128, 2));
        // 15 degrees = 7.5 half-degrees
        assert_eq!(Hsv::from_rgb(&Rgb([4, 1, 0])), Hsv::new(8, 255, 4));
        // 345 degrees = 172.5 half-degrees
        assert_eq!(Hsv::from_rgb(&Rgb([4, 0, 1])), Hsv::new(173, 255, 4));
    }

    #[test]
    fn test_hue_wraps_near_red() {
        // magenta-red at ~358 degrees lands on the top of the hue axis
        let hsv = Hsv::from_rgb(&Rgb([255, 0, 10]));
        assert_eq!(hsv.h, 179);

        // 359.5 degrees rounds to 180 and wraps to 0
        let hsv = Hsv::from_rgb(&Rgb([255, 0, 2]));
        assert_eq!(hsv.h, 0);
    }

    #[test]
    fn test_image_conversion_keeps_layout() {
        let mut frame = RgbImage::new(3, 2);
        frame.put_pixel(2, 1, Rgb([0, 0, 255]));

        let hsv = HsvImage::from_rgb(&frame);
        assert_eq!(hsv.dimensions(), (3, 2));
        assert_eq!(hsv.get(2, 1), Hsv::new(120, 255, 255));
        assert_eq!(hsv.get(0, 0), Hsv::new(0, 0, 0));
        // source untouched
        assert_eq!(frame.get_pixel(2, 1), &Rgb([0, 0, 255]));
    }
}
