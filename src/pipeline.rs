use crate::background::BackgroundModel;
use crate::capture::{CameraSource, CaptureStream};
use crate::composite;
use crate::config::PipelineConfig;
use crate::error::{CloakError, Result};
use crate::output::OutputSink;
use crate::segmentation::{self, ColorKeySegmenter, ColorProfile, MaskRefiner};
use image::imageops;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cross-thread stop request, polled once per frame
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    CapturingBackground,
    Streaming,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::CapturingBackground,
            2 => PipelineState::Streaming,
            _ => PipelineState::Idle,
        }
    }
}

/// Shared view of the controller state, readable while a session runs
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<AtomicU8>);

impl Default for StateHandle {
    fn default() -> Self {
        Self(Arc::new(AtomicU8::new(PipelineState::Idle as u8)))
    }
}

impl StateHandle {
    pub fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: PipelineState) {
        let previous = PipelineState::from_u8(self.0.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            tracing::debug!("Pipeline state {:?} -> {:?}", previous, state);
        }
    }
}

/// Why a session ended cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The stop signal was observed
    Stopped,
    /// `max_frames` frames were delivered
    FrameLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub profile: String,
    pub frames_delivered: u64,
    pub end: SessionEnd,
}

/// Drives cloak sessions against one camera source.
///
/// Each call to [`start`](Self::start) is a full session: profile lookup,
/// camera acquisition, a fresh background capture, then streaming until the
/// stop signal, the frame budget, or an error. The camera stream is dropped,
/// and the state returns to `Idle`, on every exit path.
pub struct PipelineController<C: CameraSource> {
    source: C,
    config: PipelineConfig,
    state: StateHandle,
    stop: StopSignal,
}

impl<C: CameraSource> PipelineController<C> {
    pub fn new(source: C, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            state: StateHandle::default(),
            stop: StopSignal::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// Handle for watching the state from another thread (or from a sink)
    pub fn state_handle(&self) -> StateHandle {
        self.state.clone()
    }

    /// Handle for stopping the session from another thread (or from a sink)
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Request a stop at the next frame boundary
    pub fn stop(&self) {
        self.stop.set();
    }

    /// Run one session to completion
    pub fn start<O: OutputSink>(&mut self, profile_name: &str, sink: &mut O) -> Result<SessionReport> {
        let profile = segmentation::lookup(profile_name)?;
        self.stop.clear();

        tracing::info!("Starting {} cloak session", profile.name());

        let mut stream = self
            .source
            .open()
            .map_err(|source| CloakError::CameraUnavailable { source })?;
        let (width, height) = stream.resolution();
        tracing::info!("Camera opened at {}x{}", width, height);

        let result = self.run_session(&mut stream, profile, sink);

        drop(stream);
        self.state.set(PipelineState::Idle);

        match &result {
            Ok(report) => tracing::info!(
                "Session ended ({:?}) after {} frames",
                report.end,
                report.frames_delivered
            ),
            Err(e) => tracing::error!("Session aborted: {}", error_chain(e)),
        }

        result
    }

    fn run_session<S, O>(&mut self, stream: &mut S, profile: ColorProfile, sink: &mut O) -> Result<SessionReport>
    where
        S: CaptureStream,
        O: OutputSink,
    {
        self.state.set(PipelineState::CapturingBackground);
        tracing::info!("Capturing background, keep the cloak out of frame");

        let background = BackgroundModel::capture(
            stream,
            self.config.warmup,
            self.config.background_frames,
            self.config.background_mode,
        )?;

        let session = PipelineSession {
            segmenter: ColorKeySegmenter::new(profile),
            refiner: self.config.refiner(),
            background,
        };

        self.state.set(PipelineState::Streaming);
        session.stream(stream, sink, &self.stop, &self.config)
    }
}

fn error_chain(error: &CloakError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// State held for one session: the active profile and its background
struct PipelineSession {
    segmenter: ColorKeySegmenter,
    refiner: MaskRefiner,
    background: BackgroundModel,
}

impl PipelineSession {
    fn stream<S, O>(
        &self,
        stream: &mut S,
        sink: &mut O,
        stop: &StopSignal,
        config: &PipelineConfig,
    ) -> Result<SessionReport>
    where
        S: CaptureStream,
        O: OutputSink,
    {
        let frame_duration = config.frame_duration();
        let mut frame_count = 0u64;
        let mut total_capture_time = Duration::ZERO;
        let mut total_segment_time = Duration::ZERO;
        let mut total_composite_time = Duration::ZERO;
        let mut total_output_time = Duration::ZERO;

        let (out_width, out_height) = sink.resolution();
        tracing::info!(
            "Streaming {} cloak to {}x{} output, show_mask={}",
            self.segmenter.profile().name(),
            out_width,
            out_height,
            config.show_mask
        );

        loop {
            let loop_start = Instant::now();
            let frame_number = frame_count + 1;

            // Capture frame
            let capture_start = Instant::now();
            let mut frame = stream
                .capture_frame()
                .map_err(|source| CloakError::CameraReadFailure {
                    frame: frame_number,
                    source,
                })?;
            imageops::flip_horizontal_in_place(&mut frame);
            total_capture_time += capture_start.elapsed();

            // Segmentation and cleanup
            let segment_start = Instant::now();
            let raw = self.segmenter.classify(&frame);
            let mask = self.refiner.refine(&raw);
            total_segment_time += segment_start.elapsed();

            // Composite
            let composite_start = Instant::now();
            let output_frame = if config.show_mask {
                mask.to_rgb()
            } else {
                composite::blend(self.background.pixels(), &frame, &mask)?
            };
            total_composite_time += composite_start.elapsed();

            // Output frame
            let output_start = Instant::now();
            sink.write_frame(&output_frame)
                .map_err(|source| CloakError::SinkFailure {
                    frame: frame_number,
                    source,
                })?;
            total_output_time += output_start.elapsed();

            frame_count += 1;

            // Log stats every 30 frames
            if frame_count % 30 == 0 {
                let avg_ms = |total: Duration| total.as_secs_f64() * 1000.0 / frame_count as f64;
                let avg_capture_ms = avg_ms(total_capture_time);
                let avg_segment_ms = avg_ms(total_segment_time);
                let avg_composite_ms = avg_ms(total_composite_time);
                let avg_output_ms = avg_ms(total_output_time);
                let total_ms = avg_capture_ms + avg_segment_ms + avg_composite_ms + avg_output_ms;

                tracing::info!(
                    "Frame {}: capture={:.1}ms, segment={:.1}ms, composite={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
                    frame_count,
                    avg_capture_ms,
                    avg_segment_ms,
                    avg_composite_ms,
                    avg_output_ms,
                    total_ms,
                    1000.0 / total_ms
                );
            }

            if stop.is_set() {
                return Ok(self.report(frame_count, SessionEnd::Stopped));
            }
            if config.max_frames.is_some_and(|max| frame_count >= max) {
                return Ok(self.report(frame_count, SessionEnd::FrameLimit));
            }

            // Frame rate limiting
            if let Some(frame_duration) = frame_duration {
                let elapsed = loop_start.elapsed();
                if elapsed < frame_duration {
                    std::thread::sleep(frame_duration - elapsed);
                }
            }
        }
    }

    fn report(&self, frames_delivered: u64, end: SessionEnd) -> SessionReport {
        SessionReport {
            profile: self.segmenter.profile().name().to_string(),
            frames_delivered,
            end,
        }
    }
}
