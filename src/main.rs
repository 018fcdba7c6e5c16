use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cloak::capture::WebcamSource;
use cloak::output::V4L2Output;
use cloak::segmentation::{profile_names, profiles, HsvRange};
use cloak::{BackgroundMode, PipelineConfig, PipelineController, StopSignal};
use std::io::BufRead;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cloak color, by name or menu number (see --list-colors)
    #[arg(short, long, default_value = "red")]
    color: String,

    /// List the available cloak colors and exit
    #[arg(long)]
    list_colors: bool,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 640)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 480)]
    capture_height: u32,

    /// Output resolution width
    #[arg(long, default_value_t = 640)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 480)]
    output_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// Milliseconds to wait for exposure to settle before the background is sampled
    #[arg(long, default_value_t = 2000)]
    warmup_ms: u64,

    /// Frames read for the background window
    #[arg(long, default_value_t = 30)]
    background_frames: u32,

    /// How the background window is reduced to one image
    #[arg(long, value_enum, default_value_t = BackgroundArg::Latest)]
    background_mode: BackgroundArg,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Show the cleaned cloak mask instead of the composite
    #[arg(long)]
    show_mask: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackgroundArg {
    Latest,
    Average,
}

impl From<BackgroundArg> for BackgroundMode {
    fn from(arg: BackgroundArg) -> Self {
        match arg {
            BackgroundArg::Latest => BackgroundMode::Latest,
            BackgroundArg::Average => BackgroundMode::Average,
        }
    }
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            warmup: Duration::from_millis(self.warmup_ms),
            background_frames: self.background_frames,
            background_mode: self.background_mode.into(),
            target_fps: Some(self.fps),
            max_frames: self.max_frames,
            show_mask: self.show_mask,
            ..Default::default()
        }
    }

    /// Menu numbers map onto the profile table order
    fn color_name(&self) -> String {
        match self.color.trim().parse::<usize>() {
            Ok(n) if n >= 1 => profile_names()
                .nth(n - 1)
                .map(str::to_string)
                .unwrap_or_else(|| self.color.clone()),
            _ => self.color.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_colors {
        return list_colors();
    }

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cloak starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Output: {}x{}", args.output_width, args.output_height);
    tracing::info!("Target FPS: {}", args.fps);

    let source = WebcamSource::new(args.input_device, args.capture_width, args.capture_height);

    let mut output = V4L2Output::new(&args.output_device, args.output_width, args.output_height)
        .context("Failed to initialize v4l2loopback output")?;

    let mut controller = PipelineController::new(source, args.pipeline_config());
    spawn_console_control(controller.stop_signal());

    let color = args.color_name();
    tracing::info!("Selected cloak color: {}", color);
    tracing::info!("Step out of the frame for the background capture; type q then Enter to stop");

    let report = match controller.start(&color, &mut output) {
        Ok(report) => report,
        Err(e) if e.is_rejected_before_capture() => {
            eprintln!("{}", e);
            list_colors()?;
            return Err(e).context("No cloak session started");
        }
        Err(e) => return Err(e).context("Cloak session failed"),
    };

    tracing::info!(
        "{} cloak stopped after {} frames",
        report.profile,
        report.frames_delivered
    );

    Ok(())
}

/// Print the color menu with each profile's HSV bounds
fn list_colors() -> Result<()> {
    let table = profiles().context("Built-in color table is invalid")?;
    for (i, profile) in table.iter().enumerate() {
        let bounds: Vec<String> = profile.ranges().iter().map(describe_range).collect();
        println!("  {}. {:<8} {}", i + 1, profile.name(), bounds.join(" or "));
    }
    Ok(())
}

fn describe_range(range: &HsvRange) -> String {
    let (lo, hi) = (range.lower, range.upper);
    format!(
        "H {}-{} S {}-{} V {}-{}",
        lo.h, hi.h, lo.s, hi.s, lo.v, hi.v
    )
}

/// Set the stop signal when `q` is entered on stdin
fn spawn_console_control(stop: StopSignal) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    tracing::info!("Stop requested");
                    stop.set();
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Console input closed: {}", e);
                    break;
                }
            }
        }
    });
}
