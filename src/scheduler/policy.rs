//! Threshold rule for the delta trigger.

use crate::config::ScheduleConfig;

/// Decides whether a document changed enough since the baseline to deserve
/// an automatic snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeltaPolicy {
    /// Absolute change in characters that is always enough.
    pub min_chars: usize,
    /// Change relative to the baseline length that is enough.
    pub min_ratio: f64,
}

impl Default for DeltaPolicy {
    fn default() -> Self {
        Self {
            min_chars: 400,
            min_ratio: 0.05,
        }
    }
}

impl DeltaPolicy {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            min_chars: config.delta_chars,
            min_ratio: config.delta_ratio,
        }
    }

    /// True iff `|L - L'| > min_chars` or `|L - L'| / L > min_ratio`.
    ///
    /// Lengths are in characters. An empty baseline with any change counts
    /// as exceeding.
    pub fn exceeds(&self, baseline_len: usize, current_len: usize) -> bool {
        let diff = baseline_len.abs_diff(current_len);
        if diff > self.min_chars {
            return true;
        }
        if baseline_len == 0 {
            return diff > 0;
        }
        diff as f64 / baseline_len as f64 > self.min_ratio
    }

    /// Compare two documents by character count.
    pub fn exceeds_between(&self, baseline: &str, current: &str) -> bool {
        self.exceeds(baseline.chars().count(), current.chars().count())
    }
}
