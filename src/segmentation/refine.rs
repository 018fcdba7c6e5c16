use super::types::Mask;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

/// Morphological cleanup of a raw cloak mask.
///
/// An opening (erode `open_iterations` times, then dilate as many times)
/// drops isolated speckles; a final dilation grows the surviving regions back
/// out to close pinholes and cover the edge lost to erosion. The structuring
/// neighborhood is a square of side `kernel_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRefiner {
    kernel_size: u8,
    open_iterations: u32,
    dilate_iterations: u32,
}

impl Default for MaskRefiner {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            open_iterations: 2,
            dilate_iterations: 1,
        }
    }
}

impl MaskRefiner {
    /// `kernel_size` is rounded up to the next odd value
    pub fn new(kernel_size: u8, open_iterations: u32, dilate_iterations: u32) -> Self {
        Self {
            kernel_size: kernel_size.max(1) | 1,
            open_iterations,
            dilate_iterations,
        }
    }

    pub fn kernel_size(&self) -> u8 {
        self.kernel_size
    }

    fn radius(&self) -> u8 {
        self.kernel_size / 2
    }

    /// Opening only: erode then dilate, `open_iterations` times each
    pub fn open(&self, mask: &Mask) -> Mask {
        let k = self.radius();
        let mut image = mask.as_gray().clone();
        for _ in 0..self.open_iterations {
            image = erode(&image, Norm::LInf, k);
        }
        for _ in 0..self.open_iterations {
            image = dilate(&image, Norm::LInf, k);
        }
        Mask::from_gray(image)
    }

    pub fn refine(&self, mask: &Mask) -> Mask {
        let _span = tracing::debug_span!("refine").entered();

        let k = self.radius();
        let mut image = self.open(mask).into_gray();
        for _ in 0..self.dilate_iterations {
            image = dilate(&image, Norm::LInf, k);
        }
        Mask::from_gray(image)
    }
}
