//! Interpolation feasibility heuristics derived from gap lengths and density.

use super::gaps::gap_lengths;
use std::fmt;

/// Longest gap (hours) still bridged by linear interpolation.
pub const SHORT_GAP_MAX: usize = 3;
/// Longest gap (hours) still bridged by time-based interpolation.
pub const MEDIUM_GAP_MAX: usize = 24;

/// Density above which interpolation alone is enough.
pub const SUITABLE_DENSITY: f64 = 0.95;
/// Density above which interpolation plus forward fill is enough.
pub const COMBINE_DENSITY: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapClass {
    Short,
    Medium,
    Long,
}

impl GapClass {
    pub fn classify(length: usize) -> Self {
        if length <= SHORT_GAP_MAX {
            GapClass::Short
        } else if length <= MEDIUM_GAP_MAX {
            GapClass::Medium
        } else {
            GapClass::Long
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Interpolate,
    InterpolateAndForwardFill,
    DropOrImpute,
}

impl Recommendation {
    /// Thresholds: `> 0.95` interpolate, `> 0.80` combine, otherwise drop.
    pub fn from_density(density: f64) -> Self {
        if density > SUITABLE_DENSITY {
            Recommendation::Interpolate
        } else if density > COMBINE_DENSITY {
            Recommendation::InterpolateAndForwardFill
        } else {
            Recommendation::DropOrImpute
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Recommendation::Interpolate => "✓",
            Recommendation::InterpolateAndForwardFill => "⚠",
            Recommendation::DropOrImpute => "✗",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::Interpolate => "interpolation suitable",
            Recommendation::InterpolateAndForwardFill => "combine interpolation + forward fill",
            Recommendation::DropOrImpute => "consider dropping feature or extensive imputation",
        };
        f.write_str(text)
    }
}

/// Fraction of present entries; an empty series has density 0.
pub fn density(total: usize, missing: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (total - missing) as f64 / total as f64
}

/// Feasibility of filling one feature's gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Feasibility {
    pub feature: String,
    pub missing_count: usize,
    pub short_gaps: usize,
    pub medium_gaps: usize,
    pub long_gaps: usize,
    pub density: f64,
    pub recommendation: Recommendation,
}

impl Feasibility {
    pub fn assess(feature: &str, mask: &[bool]) -> Self {
        let lengths = gap_lengths(mask);
        let missing_count: usize = lengths.iter().sum();

        let (mut short_gaps, mut medium_gaps, mut long_gaps) = (0, 0, 0);
        for &length in &lengths {
            match GapClass::classify(length) {
                GapClass::Short => short_gaps += 1,
                GapClass::Medium => medium_gaps += 1,
                GapClass::Long => long_gaps += 1,
            }
        }

        let density = density(mask.len(), missing_count);
        Self {
            feature: feature.to_string(),
            missing_count,
            short_gaps,
            medium_gaps,
            long_gaps,
            density,
            recommendation: Recommendation::from_density(density),
        }
    }
}
