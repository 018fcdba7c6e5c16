use super::{CameraSource, CaptureStream};
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

/// Webcam device that opens a fresh stream per session
pub struct WebcamSource {
    device_index: u32,
    width: u32,
    height: u32,
}

impl WebcamSource {
    pub fn new(device_index: u32, width: u32, height: u32) -> Self {
        Self {
            device_index,
            width,
            height,
        }
    }
}

impl CameraSource for WebcamSource {
    type Stream = WebcamCapture;

    fn open(&mut self) -> Result<WebcamCapture> {
        WebcamCapture::new(self.device_index, self.width, self.height)
    }
}

pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(width, height),
        ));

        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .with_context(|| format!("Failed to open camera {}", device_index))?;
        camera
            .open_stream()
            .with_context(|| format!("Failed to start stream on camera {}", device_index))?;

        // the driver may not honour the request exactly
        let actual = camera.resolution();
        if (actual.width(), actual.height()) != (width, height) {
            tracing::warn!(
                "Camera {} gave {}x{} instead of {}x{}",
                device_index,
                actual.width(),
                actual.height(),
                width,
                height
            );
        }

        Ok(Self {
            camera,
            width: actual.width(),
            height: actual.height(),
        })
    }
}

impl CaptureStream for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let image = self
            .camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>())
            .context("Failed to read a frame from the webcam")?;

        if image.dimensions() != (self.width, self.height) {
            tracing::debug!(
                "Webcam frame is {}x{}, stream opened at {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
        }

        Ok(image)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => tracing::info!("Webcam stream released"),
            Err(e) => tracing::warn!("Failed to stop webcam stream: {}", e),
        }
    }
}
