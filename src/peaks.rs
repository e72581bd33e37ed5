//! Peak-recurrence heuristics.
//!
//! A peak is an observation at or above a threshold. The gaps between
//! consecutive peaks give a mean recurrence interval; the longer the current
//! gap runs past that mean, the higher the estimated pressure for the next
//! peak.

use crate::{math_utils::round1, results::PeakAnalysis};

/// Observations at or above this are peaks.
pub const PEAK_THRESHOLD: f64 = 10.0;
/// Probability reported when fewer than two peaks exist.
pub const INSUFFICIENT_PEAK_PROBABILITY: f64 = 5.0;
/// Text reported when fewer than two peaks exist.
pub const INSUFFICIENT_PEAK_TEXT: &str = "Insufficient peak history to predict.";

const COMPRESSION_WINDOW: usize = 10;
const COMPRESSION_MIN_COUNT: usize = 8;
const COMPRESSION_BONUS: f64 = 15.0;
const DEAD_ZONE_WINDOW: usize = 5;
const DEAD_ZONE_BONUS: f64 = 10.0;
const SMALL_VALUE: f64 = 2.0;

/// Gap statistics for values at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapStatistics {
    /// Number of qualifying observations
    pub peaks: usize,
    /// Mean index distance between consecutive qualifying observations
    pub mean_gap: f64,
    /// Observations since the last qualifying one
    pub current_gap: usize,
}

impl GapStatistics {
    /// `current_gap / mean_gap`
    pub fn pressure_factor(&self) -> f64 {
        self.current_gap as f64 / self.mean_gap
    }

    /// True when the current gap strictly exceeds the mean gap.
    pub fn is_overdue(&self) -> bool {
        self.current_gap as f64 > self.mean_gap
    }
}

/// Gap statistics for `threshold`, or `None` with fewer than two qualifying
/// observations.
pub fn gap_statistics(history: &[f64], threshold: f64) -> Option<GapStatistics> {
    let indices: Vec<usize> = history
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= threshold)
        .map(|(i, _)| i)
        .collect();
    if indices.len() < 2 {
        return None;
    }

    let gap_sum: usize = indices.windows(2).map(|w| w[1] - w[0]).sum();
    let mean_gap = gap_sum as f64 / (indices.len() - 1) as f64;
    let last = indices[indices.len() - 1];
    Some(GapStatistics {
        peaks: indices.len(),
        mean_gap,
        current_gap: history.len() - 1 - last,
    })
}

/// True when the run since the last value ≥ `threshold` is longer than the
/// mean gap between such values.
pub fn gap_signal(history: &[f64], threshold: f64) -> bool {
    gap_statistics(history, threshold).is_some_and(|g| g.is_overdue())
}

/// Estimate the probability (percent) of a peak on the next observation.
pub fn peak_analysis(history: &[f64]) -> PeakAnalysis {
    let Some(gaps) = gap_statistics(history, PEAK_THRESHOLD) else {
        return PeakAnalysis {
            probability: INSUFFICIENT_PEAK_PROBABILITY,
            text: INSUFFICIENT_PEAK_TEXT.to_string(),
        };
    };

    let mut probability = ((gaps.pressure_factor() - 0.4) * 60.0).clamp(0.0, 98.0);

    let recent = &history[history.len().saturating_sub(COMPRESSION_WINDOW)..];
    if recent.iter().filter(|&&v| v < SMALL_VALUE).count() >= COMPRESSION_MIN_COUNT {
        probability += COMPRESSION_BONUS;
    }

    let last = &history[history.len().saturating_sub(DEAD_ZONE_WINDOW)..];
    if last.iter().all(|&v| v < SMALL_VALUE) {
        probability += DEAD_ZONE_BONUS;
    }

    let probability = probability.min(99.0);

    let comment = if probability > 85.0 {
        "PEAK IMMINENT (critical gap and compression)."
    } else if probability > 60.0 {
        "Very propitious zone for a peak."
    } else if probability > 40.0 {
        "Accumulating."
    } else {
        "Patience."
    };

    PeakAnalysis {
        probability: round1(probability),
        text: format!(
            "Last peak {} turns ago (mean gap {:.1}). {}",
            gaps.current_gap, gaps.mean_gap, comment
        ),
    }
}
