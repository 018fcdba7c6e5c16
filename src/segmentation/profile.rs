//! Fixed table of cloak colors.
//!
//! Each profile holds one or two inclusive HSV ranges. Colors whose hue
//! straddles the top of the hue axis (red) need two disjoint ranges, one at
//! each end. Saturation and value floors keep dim or washed-out pixels from
//! matching under poor lighting.

use super::hsv::Hsv;
use crate::error::{CloakError, Result};

/// Inclusive bounds on all three HSV channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        hsv.h >= self.lower.h
            && hsv.h <= self.upper.h
            && hsv.s >= self.lower.s
            && hsv.s <= self.upper.s
            && hsv.v >= self.lower.v
            && hsv.v <= self.upper.v
    }

    fn is_ordered(&self) -> bool {
        self.lower.h <= self.upper.h && self.lower.s <= self.upper.s && self.lower.v <= self.upper.v
    }

    fn hue_overlaps(&self, other: &HsvRange) -> bool {
        self.lower.h <= other.upper.h && other.lower.h <= self.upper.h
    }
}

/// A named cloak color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorProfile {
    name: String,
    ranges: Vec<HsvRange>,
}

impl ColorProfile {
    /// Build a profile from one range, or two hue-disjoint ranges
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| CloakError::InvalidProfile {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if ranges.is_empty() || ranges.len() > 2 {
            return Err(invalid(&format!(
                "expected 1 or 2 ranges, got {}",
                ranges.len()
            )));
        }
        if ranges.iter().any(|r| !r.is_ordered()) {
            return Err(invalid("lower bound exceeds upper bound"));
        }
        if let [first, second] = ranges.as_slice() {
            if first.hue_overlaps(second) {
                return Err(invalid("hue ranges overlap"));
            }
        }

        Ok(Self { name, ranges })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ranges(&self) -> &[HsvRange] {
        &self.ranges
    }

    /// True when the pixel lies in any of the profile's ranges
    pub fn matches(&self, hsv: Hsv) -> bool {
        self.ranges.iter().any(|range| range.contains(hsv))
    }
}

const fn range(lower: (u8, u8, u8), upper: (u8, u8, u8)) -> HsvRange {
    HsvRange::new(
        Hsv::new(lower.0, lower.1, lower.2),
        Hsv::new(upper.0, upper.1, upper.2),
    )
}

/// Hand-tuned bounds, in menu order
const PROFILE_TABLE: &[(&str, &[HsvRange])] = &[
    (
        "Red",
        &[
            range((0, 120, 70), (10, 255, 255)),
            range((170, 120, 70), (180, 255, 255)),
        ],
    ),
    ("Blue", &[range((100, 150, 50), (140, 255, 255))]),
    ("Green", &[range((40, 50, 50), (80, 255, 255))]),
    ("Yellow", &[range((20, 100, 100), (30, 255, 255))]),
    ("Black", &[range((0, 0, 0), (180, 255, 50))]),
];

/// Names of every profile, in menu order
pub fn profile_names() -> impl Iterator<Item = &'static str> {
    PROFILE_TABLE.iter().map(|(name, _)| *name)
}

/// Every profile in the table
pub fn profiles() -> Result<Vec<ColorProfile>> {
    PROFILE_TABLE
        .iter()
        .map(|(name, ranges)| ColorProfile::new(*name, ranges.to_vec()))
        .collect()
}

/// Find a profile by name, ignoring case
pub fn lookup(name: &str) -> Result<ColorProfile> {
    let (found, ranges) = PROFILE_TABLE
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| CloakError::UnknownProfile {
            name: name.to_string(),
        })?;

    ColorProfile::new(*found, ranges.to_vec())
}
