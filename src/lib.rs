//! Color-key "invisibility cloak" compositor.
//!
//! A background still is captured once per session; every live frame is then
//! segmented by hue against a cloak color profile, the mask is cleaned up
//! morphologically, and background pixels are substituted wherever the cloak
//! was found.

pub mod background;
pub mod capture;
pub mod composite;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use background::{BackgroundMode, BackgroundModel};
pub use config::PipelineConfig;
pub use error::{CloakError, Result};
pub use pipeline::{PipelineController, PipelineState, SessionEnd, SessionReport, StateHandle, StopSignal};
