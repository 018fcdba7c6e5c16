use image::{GrayImage, Luma, RgbImage};

/// Mask value for pixels matching the cloak color
pub const MASK_ON: u8 = 255;

/// Binary cloak mask: 255 where the cloak color was found, 0 elsewhere.
/// Dimensions match the frame it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    /// Empty mask
    pub fn new(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { MASK_ON } else { 0 }])
        }))
    }

    /// Wrap a grayscale image, treating any non-zero value as set
    pub fn from_gray(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                pixel[0] = MASK_ON;
            }
        }
        Self(image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.0
            .put_pixel(x, y, Luma([if value { MASK_ON } else { 0 }]));
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.0.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }

    /// Render as a black/white RGB frame for visualization
    pub fn to_rgb(&self) -> RgbImage {
        let (width, height) = self.dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            let value = self.0.get_pixel(x, y)[0];
            image::Rgb([value, value, value])
        })
    }
}
