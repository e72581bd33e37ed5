//! Closed-form least-squares fitters and the R² goodness-of-fit measure.
//!
//! All fitters regress on `(index, value)` pairs, where the index is the
//! zero-based position in the sequence. They are pure: identical input gives
//! bit-identical output.

use crate::math_utils::constants::SINGULAR_DETERMINANT;
use nalgebra::{Matrix3, Vector3};

/// Straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line
    pub slope: f64,
    /// Value at x = 0
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`.
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Degree-2 polynomial `y = a x² + b x + c`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadraticFit {
    /// Quadratic coefficient
    pub a: f64,
    /// Linear coefficient
    pub b: f64,
    /// Constant term
    pub c: f64,
}

impl QuadraticFit {
    /// Evaluate the polynomial at `x`.
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }

    /// True for the degenerate all-zero polynomial returned on singular systems.
    pub fn is_degenerate(&self) -> bool {
        self.a == 0.0 && self.b == 0.0 && self.c == 0.0
    }
}

/// Ordinary least squares on `(i, values[i])`.
///
/// Uses the raw-sum form `m = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`. With fewer
/// than two points the denominator is zero and the slope is non-finite; the
/// forecasting paths never call it with fewer than three.
pub fn fit_linear(values: &[f64]) -> LinearFit {
    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    LinearFit { slope, intercept }
}

/// Line fitted to `ln(values)`.
///
/// Returns `None` unless every value is strictly positive; the caller skips
/// the geometric rule entirely in that case.
pub fn fit_log_linear(values: &[f64]) -> Option<(LinearFit, Vec<f64>)> {
    if values.iter().any(|&v| v <= 0.0) {
        return None;
    }
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    Some((fit_linear(&logs), logs))
}

/// Quadratic least squares via Cramer's rule on the 3×3 normal equations.
///
/// A system whose determinant magnitude is below `1e-9` yields the zero
/// polynomial instead of an error.
pub fn fit_quadratic(values: &[f64]) -> QuadraticFit {
    let n = values.len() as f64;
    let (mut sx, mut sx2, mut sx3, mut sx4) = (0.0, 0.0, 0.0, 0.0);
    let (mut sy, mut sxy, mut sx2y) = (0.0, 0.0, 0.0);

    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        let x3 = x2 * x;
        sx += x;
        sx2 += x2;
        sx3 += x3;
        sx4 += x3 * x;
        sy += y;
        sxy += x * y;
        sx2y += x2 * y;
    }

    // Unknowns ordered [a, b, c] for a x² + b x + c
    let system = Matrix3::new(sx4, sx3, sx2, sx3, sx2, sx, sx2, sx, n);
    let rhs = Vector3::new(sx2y, sxy, sy);

    let det = system.determinant();
    if det.abs() < SINGULAR_DETERMINANT {
        log::warn!(
            "Quadratic normal equations are singular (det = {:.3e}), using zero polynomial",
            det
        );
        return QuadraticFit::default();
    }

    let cramer = |column: usize| {
        let mut replaced = system;
        replaced.set_column(column, &rhs);
        replaced.determinant() / det
    };

    QuadraticFit {
        a: cramer(0),
        b: cramer(1),
        c: cramer(2),
    }
}

/// Coefficient of determination of `model` against `(i, values[i])`.
///
/// A constant series has zero total variance; that case returns 0 rather
/// than dividing by zero.
pub fn r_squared<F>(values: &[f64], model: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if values.is_empty() {
        return 0.0;
    }
    let mean_y = values.iter().sum::<f64>() / values.len() as f64;
    let ss_tot: f64 = values.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (y - model(i as f64)).powi(2))
        .sum();

    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_linear_perfect_fit() {
        let fit = fit_linear(&[3.0, 5.0, 7.0, 9.0]);
        assert_approx_eq!(fit.slope, 2.0, 1e-12);
        assert_approx_eq!(fit.intercept, 3.0, 1e-12);
        assert_approx_eq!(fit.evaluate(4.0), 11.0, 1e-12);
    }

    #[test]
    fn test_linear_noisy_data() {
        let values = [2.1, 3.9, 6.2, 7.8, 9.9];
        let fit = fit_linear(&values);
        assert!((fit.slope - 1.95).abs() < 1e-9);
        let r2 = r_squared(&values, |x| fit.evaluate(x));
        assert!(r2 > 0.99 && r2 < 1.0);
    }

    #[test]
    fn test_log_linear_requires_positive() {
        assert!(fit_log_linear(&[1.0, 0.0, 2.0]).is_none());
        assert!(fit_log_linear(&[1.0, -3.0, 2.0]).is_none());

        let (fit, logs) = fit_log_linear(&[2.0, 4.0, 8.0, 16.0]).unwrap();
        assert_approx_eq!(fit.slope, 2f64.ln(), 1e-12);
        assert_approx_eq!(fit.intercept, 2f64.ln(), 1e-12);
        assert_eq!(logs.len(), 4);
    }

    #[test]
    fn test_quadratic_exact() {
        // y = x² + 2x + 1
        let values = [1.0, 4.0, 9.0, 16.0, 25.0];
        let fit = fit_quadratic(&values);
        assert_approx_eq!(fit.a, 1.0, 1e-9);
        assert_approx_eq!(fit.b, 2.0, 1e-9);
        assert_approx_eq!(fit.c, 1.0, 1e-9);
        assert_approx_eq!(r_squared(&values, |x| fit.evaluate(x)), 1.0, 1e-12);
    }

    #[test]
    fn test_quadratic_singular_system_is_zero() {
        // A single point gives a rank-1 normal matrix
        let fit = fit_quadratic(&[4.0]);
        assert!(fit.is_degenerate());
        assert_eq!(fit.evaluate(10.0), 0.0);

        let fit = fit_quadratic(&[]);
        assert!(fit.is_degenerate());
    }

    #[test]
    fn test_r_squared_constant_series_is_zero() {
        let values = [5.0, 5.0, 5.0, 5.0];
        let fit = fit_linear(&values);
        assert_eq!(r_squared(&values, |x| fit.evaluate(x)), 0.0);
    }

    #[test]
    fn test_fits_are_bit_identical() {
        let values = [1.3, 2.9, 2.2, 7.5, 4.4, 3.3];
        let first = (fit_linear(&values), fit_quadratic(&values));
        let second = (fit_linear(&values), fit_quadratic(&values));
        assert_eq!(first, second);

        let r2_a = r_squared(&values, |x| first.1.evaluate(x));
        let r2_b = r_squared(&values, |x| second.1.evaluate(x));
        assert_eq!(r2_a.to_bits(), r2_b.to_bits());
    }
}
