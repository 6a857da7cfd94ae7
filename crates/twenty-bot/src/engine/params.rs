use std::env;
use std::ops::RangeInclusive;
use twenty_core::belief::LikelihoodConfig;

/// Knobs for shortlist construction and attribute selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    /// Minimum number of top-ranked entities kept on the shortlist.
    pub shortlist_min: usize,
    /// Entities scoring at least `best * (1 - margin)` join the shortlist too.
    pub shortlist_margin: f64,
    /// An attribute is only asked when its gain exceeds this many bits.
    pub gain_threshold: f64,
    /// Belief share at which the shortlist collapses to the leader alone.
    pub collapse_mass: f64,
    pub likelihood: LikelihoodConfig,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            shortlist_min: 5,
            shortlist_margin: 0.25,
            gain_threshold: 0.001,
            collapse_mass: 0.95,
            likelihood: LikelihoodConfig::default(),
        }
    }
}

impl EngineParams {
    /// Accepted range for `collapse_mass`.
    pub const COLLAPSE_MASS_RANGE: RangeInclusive<f64> = 0.5..=1.0;

    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();

        let shortlist_min = read("TWQ_SHORTLIST_MIN")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value >= 1)
            .unwrap_or(base.shortlist_min);

        let shortlist_margin = read("TWQ_SHORTLIST_MARGIN")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 1.0))
            .unwrap_or(base.shortlist_margin);

        let gain_threshold = read("TWQ_GAIN_THRESHOLD")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value >= 0.0)
            .unwrap_or(base.gain_threshold);

        let collapse_mass = read("TWQ_COLLAPSE_MASS")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(|value| {
                value.clamp(
                    *Self::COLLAPSE_MASS_RANGE.start(),
                    *Self::COLLAPSE_MASS_RANGE.end(),
                )
            })
            .unwrap_or(base.collapse_mass);

        Self {
            shortlist_min,
            shortlist_margin,
            gain_threshold,
            collapse_mass,
            likelihood: LikelihoodConfig::from_reader(read),
        }
    }
}
