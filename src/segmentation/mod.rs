mod color_key;
pub mod hsv;
pub mod profile;
mod refine;
pub mod types;

pub use color_key::ColorKeySegmenter;
pub use hsv::{Hsv, HsvImage};
pub use profile::{lookup, profile_names, profiles, ColorProfile, HsvRange};
pub use refine::MaskRefiner;
pub use types::Mask;
