//! One-shot background snapshot for a cloak session.

use crate::capture::CaptureStream;
use crate::error::{CloakError, Result};
use image::{imageops, RgbImage};
use std::time::Duration;

/// How the sample window is reduced to a single background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
    /// Keep the most recent successfully read frame
    #[default]
    Latest,
    /// Per-channel mean of every successfully read frame
    Average,
}

/// Mirrored still of the empty scene, read-only once captured
#[derive(Debug)]
pub struct BackgroundModel {
    pixels: RgbImage,
}

impl BackgroundModel {
    /// Wait for the camera to settle, then sample `sample_frames` frames.
    ///
    /// Failed reads are skipped. Fails with `NoUsableFrame` only when no read
    /// in the window succeeds. The sampled frames go nowhere else.
    pub fn capture<S: CaptureStream>(
        stream: &mut S,
        warmup: Duration,
        sample_frames: u32,
        mode: BackgroundMode,
    ) -> Result<Self> {
        let _span = tracing::info_span!("capture_background").entered();

        if !warmup.is_zero() {
            tracing::info!("Waiting {:?} for the camera to settle", warmup);
            std::thread::sleep(warmup);
        }

        let mut reducer = match mode {
            BackgroundMode::Latest => Reducer::Latest(None),
            BackgroundMode::Average => Reducer::Average(None),
        };

        for attempt in 1..=sample_frames {
            match stream.capture_frame() {
                Ok(frame) => reducer.push(frame),
                Err(e) => tracing::warn!(
                    "Background read {}/{} failed: {:#}",
                    attempt,
                    sample_frames,
                    e
                ),
            }
        }

        let (mut pixels, used) = reducer.finish().ok_or(CloakError::NoUsableFrame {
            attempts: sample_frames,
        })?;
        imageops::flip_horizontal_in_place(&mut pixels);

        tracing::info!(
            "Background captured from {}/{} frames ({}x{}, {:?})",
            used,
            sample_frames,
            pixels.width(),
            pixels.height(),
            mode
        );

        Ok(Self { pixels })
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

struct Accumulator {
    width: u32,
    height: u32,
    sums: Vec<u32>,
    count: u32,
}

enum Reducer {
    Latest(Option<(RgbImage, u32)>),
    Average(Option<Accumulator>),
}

impl Reducer {
    fn push(&mut self, frame: RgbImage) {
        match self {
            Reducer::Latest(slot) => {
                let used = slot.as_ref().map_or(0, |(_, n)| *n) + 1;
                *slot = Some((frame, used));
            }
            Reducer::Average(slot) => {
                let acc = slot.get_or_insert_with(|| Accumulator {
                    width: frame.width(),
                    height: frame.height(),
                    sums: vec![0; frame.as_raw().len()],
                    count: 0,
                });
                if frame.dimensions() != (acc.width, acc.height) {
                    tracing::warn!(
                        "Skipping background frame of {}x{}, expected {}x{}",
                        frame.width(),
                        frame.height(),
                        acc.width,
                        acc.height
                    );
                    return;
                }
                for (sum, value) in acc.sums.iter_mut().zip(frame.as_raw()) {
                    *sum += *value as u32;
                }
                acc.count += 1;
            }
        }
    }

    fn finish(self) -> Option<(RgbImage, u32)> {
        match self {
            Reducer::Latest(slot) => slot,
            Reducer::Average(slot) => {
                let acc = slot?;
                let count = acc.count;
                let raw = acc
                    .sums
                    .iter()
                    .map(|sum| ((sum + count / 2) / count) as u8)
                    .collect();
                RgbImage::from_raw(acc.width, acc.height, raw).map(|image| (image, count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::Rgb;
    use std::collections::VecDeque;

    struct ScriptedStream {
        reads: VecDeque<Option<RgbImage>>,
    }

    impl ScriptedStream {
        fn new(reads: Vec<Option<RgbImage>>) -> Self {
            Self {
                reads: reads.into(),
            }
        }
    }

    impl CaptureStream for ScriptedStream {
        fn capture_frame(&mut self) -> anyhow::Result<RgbImage> {
            self.reads
                .pop_front()
                .flatten()
                .ok_or_else(|| anyhow!("no frame"))
        }

        fn resolution(&self) -> (u32, u32) {
            (2, 1)
        }
    }

    fn two_tone(left: u8, right: u8) -> RgbImage {
        RgbImage::from_fn(2, 1, |x, _| {
            let v = if x == 0 { left } else { right };
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_latest_keeps_last_good_frame_mirrored() {
        let mut stream = ScriptedStream::new(vec![
            Some(two_tone(1, 2)),
            Some(two_tone(10, 20)),
            None,
        ]);

        let background =
            BackgroundModel::capture(&mut stream, Duration::ZERO, 3, BackgroundMode::Latest)
                .unwrap();
        assert_eq!(background.pixels(), &two_tone(20, 10));
        assert!(stream.reads.is_empty());
    }

    #[test]
    fn test_average() {
        let mut stream = ScriptedStream::new(vec![
            Some(two_tone(10, 100)),
            None,
            Some(two_tone(20, 201)),
        ]);

        let background =
            BackgroundModel::capture(&mut stream, Duration::ZERO, 3, BackgroundMode::Average)
                .unwrap();
        // (100 + 201) / 2 rounds to 151, then mirrored
        assert_eq!(background.pixels(), &two_tone(151, 15));
    }

    #[test]
    fn test_average_skips_mismatched_frames() {
        let mut stream = ScriptedStream::new(vec![
            Some(two_tone(10, 10)),
            Some(RgbImage::new(4, 4)),
            Some(two_tone(30, 30)),
        ]);

        let background =
            BackgroundModel::capture(&mut stream, Duration::ZERO, 3, BackgroundMode::Average)
                .unwrap();
        assert_eq!(background.dimensions(), (2, 1));
        assert_eq!(background.pixels(), &two_tone(20, 20));
    }

    #[test]
    fn test_all_reads_fail() {
        let mut stream = ScriptedStream::new(vec![None, None]);
        let err = BackgroundModel::capture(&mut stream, Duration::ZERO, 2, BackgroundMode::Latest)
            .unwrap_err();
        assert!(matches!(err, CloakError::NoUsableFrame { attempts: 2 }));
    }

    #[test]
    fn test_empty_window() {
        let mut stream = ScriptedStream::new(vec![Some(two_tone(1, 1))]);
        let err = BackgroundModel::capture(&mut stream, Duration::ZERO, 0, BackgroundMode::Average)
            .unwrap_err();
        assert!(matches!(err, CloakError::NoUsableFrame { attempts: 0 }));
    }
}
