mod v4l_capture;

pub use v4l_capture::{WebcamCapture, WebcamSource};

use anyhow::Result;
use image::RgbImage;

/// Something that can open a camera stream for one session
pub trait CameraSource {
    type Stream: CaptureStream;

    /// Acquire the camera. The stream is released when dropped.
    fn open(&mut self) -> Result<Self::Stream>;
}

/// Trait for an open camera stream
pub trait CaptureStream {
    /// Capture a single frame
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
