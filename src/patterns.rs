//! Deterministic pattern detection.
//!
//! Rules are tried in a fixed order and the first acceptable fit wins:
//! arithmetic, geometric, quadratic, Fibonacci. There is no best-of-all-fits
//! comparison, so an arithmetic series is never reported as quadratic even
//! though a quadratic fits it equally well.

use crate::{
    config::PatternThresholds,
    math_utils::round2,
    regression::{fit_linear, fit_log_linear, fit_quadratic, r_squared},
    results::PatternType,
};

/// A matched deterministic rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternMatch {
    /// Matched rule
    pub pattern_type: PatternType,
    /// Forecast for the next three positions
    pub next_values: [f64; 3],
    /// Goodness of fit of the matched rule (1.0 for Fibonacci)
    pub confidence: f64,
}

/// Positions `n`, `n + 1`, `n + 2` evaluated through `model` and rounded.
fn extrapolate<F>(n: usize, model: F) -> [f64; 3]
where
    F: Fn(f64) -> f64,
{
    let next = |step: usize| round2(model((n - 1 + step) as f64));
    [next(1), next(2), next(3)]
}

/// Arithmetic rule: linear fit with R² above the threshold.
pub fn detect_arithmetic(history: &[f64], thresholds: &PatternThresholds) -> Option<PatternMatch> {
    let fit = fit_linear(history);
    let r2 = r_squared(history, |x| fit.evaluate(x));
    (r2 > thresholds.arithmetic_r2).then(|| PatternMatch {
        pattern_type: PatternType::Arithmetic,
        next_values: extrapolate(history.len(), |x| fit.evaluate(x)),
        confidence: r2,
    })
}

/// Geometric rule: log-space linear fit, only for strictly positive input.
pub fn detect_geometric(history: &[f64], thresholds: &PatternThresholds) -> Option<PatternMatch> {
    let (fit, logs) = fit_log_linear(history)?;
    let r2 = r_squared(&logs, |x| fit.evaluate(x));
    (r2 > thresholds.geometric_r2).then(|| PatternMatch {
        pattern_type: PatternType::Geometric,
        next_values: extrapolate(history.len(), |x| fit.evaluate(x).exp()),
        confidence: r2,
    })
}

/// Quadratic rule: degree-2 least squares with R² above the threshold.
pub fn detect_quadratic(history: &[f64], thresholds: &PatternThresholds) -> Option<PatternMatch> {
    let fit = fit_quadratic(history);
    if fit.is_degenerate() {
        return None;
    }
    let r2 = r_squared(history, |x| fit.evaluate(x));
    (r2 > thresholds.quadratic_r2).then(|| PatternMatch {
        pattern_type: PatternType::Quadratic,
        next_values: extrapolate(history.len(), |x| fit.evaluate(x)),
        confidence: r2,
    })
}

/// Fibonacci rule: every value from index 2 on is the sum of the two before
/// it, within tolerance. The forecast continues the recurrence exactly.
pub fn detect_fibonacci(history: &[f64], thresholds: &PatternThresholds) -> Option<PatternMatch> {
    let n = history.len();
    if n < 3 {
        return None;
    }
    let follows = history
        .windows(3)
        .all(|w| (w[2] - (w[1] + w[0])).abs() <= thresholds.fibonacci_tolerance);
    if !follows {
        return None;
    }

    let last = history[n - 1];
    let second_last = history[n - 2];
    let next1 = last + second_last;
    let next2 = next1 + last;
    let next3 = next2 + next1;
    Some(PatternMatch {
        pattern_type: PatternType::Fibonacci,
        next_values: [next1, next2, next3],
        confidence: 1.0,
    })
}

/// Run the rule chain in priority order.
pub fn detect_pattern(history: &[f64], thresholds: &PatternThresholds) -> Option<PatternMatch> {
    let matched = detect_arithmetic(history, thresholds)
        .or_else(|| detect_geometric(history, thresholds))
        .or_else(|| detect_quadratic(history, thresholds))
        .or_else(|| detect_fibonacci(history, thresholds));

    if let Some(m) = &matched {
        log::debug!(
            "Deterministic rule {:?} matched (confidence {:.4})",
            m.pattern_type,
            m.confidence
        );
    }
    matched
}
