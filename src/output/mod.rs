mod loopback;

pub use loopback::V4L2Output;

use anyhow::Result;
use image::RgbImage;

/// Trait for composite frame destinations
pub trait OutputSink {
    /// Accept one finished frame
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}
