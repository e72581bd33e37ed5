//! Robust statistical fallback for sequences no deterministic rule explains.
//!
//! Combines nearest-rank order statistics, an exponential moving average, an
//! RSI-style momentum state over the trailing window and an empirical
//! three-state Markov transition estimate into a bounded point forecast,
//! an interval and accumulated warnings.

use crate::{
    math_utils::{nearest_rank, round2, sorted_copy},
    results::{Interval, PatternType, PredictionResult},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trailing observations used by the momentum classifier.
pub const MOMENTUM_WINDOW: usize = 14;
/// Cap on the window length that sets the EMA smoothing constant.
pub const EMA_SPAN_CAP: usize = 10;
/// Values below this are LOW, and count as "small" for the risk checks.
pub const LOW_CEILING: f64 = 2.0;
/// Values above this are HIGH.
pub const HIGH_FLOOR: f64 = 10.0;
/// Forecast ceiling applied when a HIGH→LOW transition is likely.
pub const HIGH_TO_LOW_CLAMP: f64 = 1.5;
/// Transition frequency above which HIGH→LOW counts as likely.
pub const HIGH_TO_LOW_PROBABILITY: f64 = 0.7;

/// Nearest-rank summary of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderStatistics {
    /// `sorted[floor(n/2)]`
    pub median: f64,
    /// `sorted[floor(n/4)]`
    pub q1: f64,
    /// `sorted[floor(3n/4)]`
    pub q3: f64,
    /// `q3 - q1`
    pub iqr: f64,
}

/// Order statistics of `history`, computed on a sorted copy.
pub fn order_statistics(history: &[f64]) -> OrderStatistics {
    let sorted = sorted_copy(history);
    let median = nearest_rank(&sorted, 0.5);
    let q1 = nearest_rank(&sorted, 0.25);
    let q3 = nearest_rank(&sorted, 0.75);
    OrderStatistics {
        median,
        q1,
        q3,
        iqr: q3 - q1,
    }
}

/// Exponential moving average over the whole sequence, seeded at the first
/// value, with `k = 2 / (min(n, 10) + 1)`.
///
/// The smoothing constant stops changing once n reaches 10, but every
/// observation still enters the average.
pub fn exponential_moving_average(history: &[f64]) -> f64 {
    let Some((&first, rest)) = history.split_first() else {
        return f64::NAN;
    };
    let k = 2.0 / (history.len().min(EMA_SPAN_CAP) as f64 + 1.0);
    rest.iter().fold(first, |ema, &v| v * k + ema * (1.0 - k))
}

/// Momentum classification of the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum VolatilityState {
    /// Recent moves mostly upward
    Hot,
    /// Balanced
    Neutral,
    /// Recent moves mostly downward
    Cold,
}

/// Momentum score (0 to 100) and the state it maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    /// RSI-style score
    pub score: f64,
    /// Classification
    pub state: VolatilityState,
}

/// Classify the trailing ≤14 observations.
///
/// No losses at all is HOT with score 100; fewer than two observations is
/// NEUTRAL with score 50.
pub fn volatility_state(history: &[f64]) -> Momentum {
    let recent = &history[history.len().saturating_sub(MOMENTUM_WINDOW)..];
    if recent.len() < 2 {
        return Momentum {
            score: 50.0,
            state: VolatilityState::Neutral,
        };
    }

    let (gains, losses) = recent.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let diff = w[1] - w[0];
        if diff > 0.0 {
            (g + diff, l)
        } else {
            (g, l - diff)
        }
    });

    if losses == 0.0 {
        return Momentum {
            score: 100.0,
            state: VolatilityState::Hot,
        };
    }

    let score = 100.0 - 100.0 / (1.0 + gains / losses);
    let state = if score > 70.0 {
        VolatilityState::Hot
    } else if score < 30.0 {
        VolatilityState::Cold
    } else {
        VolatilityState::Neutral
    };
    Momentum { score, state }
}

/// LOW / MED / HIGH partition of single observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum TriState {
    /// Below 2.0
    Low,
    /// 2.0 to 10.0 inclusive
    Med,
    /// Above 10.0
    High,
}

impl TriState {
    /// Classify one observation.
    pub fn of(value: f64) -> Self {
        if value < LOW_CEILING {
            TriState::Low
        } else if value <= HIGH_FLOOR {
            TriState::Med
        } else {
            TriState::High
        }
    }

    fn index(self) -> usize {
        match self {
            TriState::Low => 0,
            TriState::Med => 1,
            TriState::High => 2,
        }
    }
}

/// Empirical transition counts out of the current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionEstimate {
    /// State of the most recent observation
    pub current: TriState,
    /// Successor counts indexed LOW, MED, HIGH
    pub counts: [usize; 3],
    /// Number of pairs starting in `current`
    pub total: usize,
}

impl TransitionEstimate {
    /// Empirical probability of moving from `current` to `to`, or `None`
    /// when `current` never appeared before the last observation.
    pub fn probability(&self, to: TriState) -> Option<f64> {
        (self.total > 0).then(|| self.counts[to.index()] as f64 / self.total as f64)
    }
}

/// Tally successors of every earlier observation that shares the current
/// (most recent) state. Returns `None` for empty input.
pub fn transition_estimate(history: &[f64]) -> Option<TransitionEstimate> {
    let current = TriState::of(*history.last()?);
    let mut counts = [0usize; 3];
    let mut total = 0;
    for pair in history.windows(2) {
        if TriState::of(pair[0]) == current {
            counts[TriState::of(pair[1]).index()] += 1;
            total += 1;
        }
    }
    Some(TransitionEstimate {
        current,
        counts,
        total,
    })
}

/// Full fallback analysis of `history`. The caller guarantees at least
/// three observations.
pub fn analyze(history: &[f64]) -> PredictionResult {
    let n = history.len();
    let stats = order_statistics(history);
    let ema = exponential_moving_average(history);
    let momentum = volatility_state(history);

    let mut forecast = stats.median.min(ema);
    let mut min = (stats.q1 - 0.5 * stats.iqr).max(0.0);
    let mut max = stats.q3 + 1.5 * stats.iqr;
    let mut warning: Option<String> = None;
    let mut high_to_low = false;

    match momentum.state {
        VolatilityState::Hot => {
            forecast *= 0.8;
            warning = Some(format!(
                "Overheated (momentum {:.0}). Correction likely.",
                momentum.score
            ));
        }
        VolatilityState::Cold => {
            max = stats.q3 * 3.0;
            warning = Some(format!(
                "Compressed (momentum {:.0}). Volatility spike possible.",
                momentum.score
            ));
        }
        VolatilityState::Neutral => {
            let small = history.iter().filter(|&&v| v < LOW_CEILING).count();
            if small as f64 / n as f64 > 0.5 {
                warning = Some(format!(
                    "High risk: most values are small (< {:.2}).",
                    LOW_CEILING
                ));
            }
        }
    }

    if let Some(transitions) = transition_estimate(history) {
        let to_low = transitions.probability(TriState::Low).unwrap_or(0.0);
        if transitions.current == TriState::High && to_low > HIGH_TO_LOW_PROBABILITY {
            forecast = forecast.min(HIGH_TO_LOW_CLAMP);
            high_to_low = true;
        }
    }

    // 3 * Q3 can undercut the lower bound only for negative quartiles
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    log::debug!(
        "Fallback analysis: median {:.3}, ema {:.3}, momentum {:.1} ({:?})",
        stats.median,
        ema,
        momentum.score,
        momentum.state
    );

    let value = round2(forecast);
    let mut result = PredictionResult {
        next_values: [value; 3],
        confidence: match momentum.state {
            VolatilityState::Neutral => 0.15,
            VolatilityState::Hot | VolatilityState::Cold => 0.25,
        },
        is_deterministic: false,
        pattern_type: PatternType::Random,
        interval: Some(Interval { min, max }),
        warning,
        monte_carlo: None,
        peak_analysis: None,
        recommendation: None,
        calm_analysis: None,
    };
    if high_to_low {
        result.push_warning("High -> Low cycle imminent.");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_order_statistics_nearest_rank() {
        let stats = order_statistics(&[9.0, 1.0, 5.0, 3.0, 7.0, 2.0, 8.0, 4.0]);
        // sorted: 1 2 3 4 5 7 8 9
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.q3, 8.0);
        assert_eq!(stats.iqr, 5.0);
    }

    #[test]
    fn test_ema_uses_whole_sequence() {
        // n = 3: k = 0.5
        assert_approx_eq!(exponential_moving_average(&[1.0, 3.0, 5.0]), 3.5, 1e-12);

        // Beyond 10 points k stays at 2/11, but the first value still matters
        let mut a = vec![100.0];
        a.extend(std::iter::repeat(1.0).take(11));
        let mut b = vec![1.0];
        b.extend(std::iter::repeat(1.0).take(11));
        assert!(exponential_moving_average(&a) > exponential_moving_average(&b));
        assert!(exponential_moving_average(&[]).is_nan());
    }

    #[test]
    fn test_volatility_state_no_losses_is_hot() {
        let m = volatility_state(&[1.0, 2.0, 2.0, 5.0]);
        assert_eq!(m.state, VolatilityState::Hot);
        assert_eq!(m.score, 100.0);
    }

    #[test]
    fn test_volatility_state_score() {
        // gains 1, losses 3: rs = 1/3, score = 25
        let m = volatility_state(&[5.0, 2.0, 3.0]);
        assert_approx_eq!(m.score, 25.0, 1e-12);
        assert_eq!(m.state, VolatilityState::Cold);

        // gains 2, losses 2: score 50
        let m = volatility_state(&[1.0, 3.0, 1.0]);
        assert_eq!(m.state, VolatilityState::Neutral);
    }

    #[test]
    fn test_volatility_state_uses_trailing_window() {
        // A large early drop falls outside the last 14 observations
        let mut history = vec![100.0, 0.0];
        history.extend((0..14).map(|i| i as f64));
        let m = volatility_state(&history);
        assert_eq!(m.state, VolatilityState::Hot);
        assert_eq!(m.score, 100.0);
    }

    #[test]
    fn test_tri_state_boundaries() {
        assert_eq!(TriState::of(1.99), TriState::Low);
        assert_eq!(TriState::of(2.0), TriState::Med);
        assert_eq!(TriState::of(10.0), TriState::Med);
        assert_eq!(TriState::of(10.01), TriState::High);
    }

    #[test]
    fn test_transition_estimate_from_current_state() {
        // current state HIGH; HIGH at 0 -> LOW, HIGH at 2 -> LOW
        let t = transition_estimate(&[12.0, 1.0, 15.0, 1.5, 11.0]).unwrap();
        assert_eq!(t.current, TriState::High);
        assert_eq!(t.total, 2);
        assert_eq!(t.counts, [2, 0, 0]);
        assert_eq!(t.probability(TriState::Low), Some(1.0));

        let t = transition_estimate(&[1.0, 5.0, 20.0]).unwrap();
        assert_eq!(t.total, 0);
        assert_eq!(t.probability(TriState::Low), None);
        assert!(transition_estimate(&[]).is_none());
    }

    #[test]
    fn test_analyze_hot_scales_forecast() {
        let history = [1.0, 2.0, 3.0, 3.5, 6.0];
        let result = analyze(&history);
        // no losses -> HOT, so min(median, ema) is scaled by 0.8
        let ema = exponential_moving_average(&history);
        let expected = round2(3.0f64.min(ema) * 0.8);
        assert_eq!(result.next_values, [expected; 3]);
        assert_eq!(result.confidence, 0.25);
        assert!(result.warning.unwrap().contains("Correction likely"));
    }

    #[test]
    fn test_analyze_cold_widens_interval() {
        let history = [9.0, 8.0, 6.0, 5.0, 3.0, 4.0];
        let result = analyze(&history);
        let interval = result.interval.unwrap();
        // sorted 3 4 5 6 8 9 -> q3 = sorted[4] = 8
        assert_eq!(interval.max, 24.0);
        assert!(interval.min <= interval.max);
        assert!(result.warning.unwrap().contains("Volatility spike possible"));
    }

    #[test]
    fn test_analyze_neutral_high_risk() {
        let history = [1.0, 1.5, 1.2, 5.0, 1.1, 1.3, 1.0];
        let result = analyze(&history);
        assert_eq!(result.confidence, 0.15);
        assert!(result.warning.unwrap().starts_with("High risk"));
    }

    #[test]
    fn test_analyze_high_to_low_appends_warning() {
        // Ends HIGH after a fall; every earlier HIGH fell straight to LOW
        let history = [20.0, 1.0, 18.0, 1.2, 15.0, 1.1, 30.0, 1.0, 12.0];
        let result = analyze(&history);
        assert!(result.next_values.iter().all(|&v| v <= 1.5));
        let warning = result.warning.unwrap();
        assert!(warning.ends_with("High -> Low cycle imminent."));
        assert_eq!(result.pattern_type, PatternType::Random);
        assert!(!result.is_deterministic);
    }

    #[test]
    fn test_analyze_cycle_warning_follows_momentum_warning() {
        // COLD (momentum 10) and the current HIGH value always fell to LOW
        let mut history = vec![15.0, 1.0, 15.0, 1.0, 15.0, 1.0, 100.0];
        history.extend(std::iter::repeat(1.0).take(12));
        history.push(12.0);
        let result = analyze(&history);
        assert_eq!(
            result.warning.as_deref(),
            Some("Compressed (momentum 10). Volatility spike possible. High -> Low cycle imminent.")
        );
        assert_eq!(result.next_values, [1.0; 3]);
        assert_eq!(result.confidence, 0.25);
    }
}
