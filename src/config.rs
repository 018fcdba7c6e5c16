use crate::background::BackgroundMode;
use crate::segmentation::MaskRefiner;
use std::time::Duration;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Settle time before the background window is sampled
    pub warmup: Duration,
    /// Frames read for the background window
    pub background_frames: u32,
    pub background_mode: BackgroundMode,
    /// Side of the square structuring neighborhood
    pub kernel_size: u8,
    pub open_iterations: u32,
    pub dilate_iterations: u32,
    /// Frame rate cap; `None` runs as fast as the camera delivers
    pub target_fps: Option<u32>,
    /// Stop cleanly after this many delivered frames
    pub max_frames: Option<u64>,
    /// Deliver the refined mask instead of the composite
    pub show_mask: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            background_frames: 30,
            background_mode: BackgroundMode::Latest,
            kernel_size: 3,
            open_iterations: 2,
            dilate_iterations: 1,
            target_fps: None,
            max_frames: None,
            show_mask: false,
        }
    }
}

impl PipelineConfig {
    pub fn refiner(&self) -> MaskRefiner {
        MaskRefiner::new(self.kernel_size, self.open_iterations, self.dilate_iterations)
    }

    pub fn frame_duration(&self) -> Option<Duration> {
        self.target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs(1) / fps)
    }
}
