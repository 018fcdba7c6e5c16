use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Writes composites to a v4l2loopback device so any video app can show them
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    /// Open the loopback device and size the sink to whatever format the
    /// driver actually accepted
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        let (width, height) = negotiate_yuyv(path, width, height)?;

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("Writing YUYV {}x{} to {}", width, height, path.display());
        Ok(Self { file, width, height })
    }
}

fn negotiate_yuyv(path: &Path, width: u32, height: u32) -> Result<(u32, u32)> {
    let device = Device::with_path(path)
        .with_context(|| format!("Failed to open {} for format setup", path.display()))?;

    let mut format = Output::format(&device).context("Failed to query output format")?;
    format.width = width;
    format.height = height;
    format.fourcc = FourCC::new(b"YUYV");

    let applied = Output::set_format(&device, &format).context("Failed to set output format")?;
    if (applied.width, applied.height) != (width, height) {
        tracing::warn!(
            "Loopback accepted {}x{} instead of {}x{}",
            applied.width,
            applied.height,
            width,
            height
        );
    }

    Ok((applied.width, applied.height))
}

/// Pack RGB into YUV422 (YUYV): two lumas per pixel pair, chroma averaged
/// across the pair. An odd trailing pixel is paired with itself.
fn rgb_to_yuyv(rgb_image: &RgbImage) -> Vec<u8> {
    let (width, height) = rgb_image.dimensions();
    let row_bytes = width as usize * 3;
    let mut yuyv = Vec::with_capacity(width.div_ceil(2) as usize * 4 * height as usize);

    if row_bytes == 0 {
        return yuyv;
    }

    for row in rgb_image.as_raw().chunks_exact(row_bytes) {
        for pair in row.chunks(6) {
            let (first, second) = pair.split_at(3);
            let second = if second.is_empty() { first } else { second };

            let (y0, u0, v0) = yuv(first);
            let (y1, u1, v1) = yuv(second);
            yuyv.extend_from_slice(&[y0, ((u0 + u1) / 2) as u8, y1, ((v0 + v1) / 2) as u8]);
        }
    }

    yuyv
}

/// Full-range BT.601 in 8.8 fixed point; chroma returned unpacked for averaging
fn yuv(rgb: &[u8]) -> (u8, u16, u16) {
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);

    let y = (77 * r + 150 * g + 29 * b + 128) >> 8;
    let u = ((-43 * r - 85 * g + 128 * b + 128) >> 8) + 128;
    let v = ((128 * r - 107 * g - 21 * b + 128) >> 8) + 128;

    (y.clamp(0, 255) as u8, u.clamp(0, 255) as u16, v.clamp(0, 255) as u16)
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let yuyv_data = if frame.dimensions() != (self.width, self.height) {
            let resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            rgb_to_yuyv(&resized)
        } else {
            rgb_to_yuyv(frame)
        };

        self.file
            .write_all(&yuyv_data)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
