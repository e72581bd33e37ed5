//! Small numerical helpers shared by the fitters and the statistical paths.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Numerical constants.
pub mod constants {
    /// Determinant magnitude below which the quadratic normal equations are
    /// treated as singular.
    pub const SINGULAR_DETERMINANT: f64 = 1e-9;
}

/// Safe comparison for floating point values (NaN sorts last).
pub fn float_total_cmp(a: &f64, b: &f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
    }
}

/// Sorted copy of `values`; the input is left untouched.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(float_total_cmp);
    sorted
}

/// Nearest-rank order statistic: `sorted[floor(n * p)]`, clamped to the last
/// element. Returns NaN for empty input.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Arithmetic mean. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to `dp` decimal places, half away from zero.
///
/// Goes through `Decimal` so that values like 1.005 round on their decimal
/// representation; values outside the `Decimal` range are returned as is.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    round_dp(value, 2)
}

/// Round to 1 decimal place.
pub fn round1(value: f64) -> f64 {
    round_dp(value, 1)
}
