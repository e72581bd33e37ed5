//! Error types and validation functions for sequence forecasting.
//!
//! The engine itself has a single real failure mode (too few observations);
//! the remaining variants cover input sanity checks, configuration and the
//! in-process collaborators (series store, number extraction).

use thiserror::Error;

/// Error types for forecasting and its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ForecastError {
    /// Insufficient data for a forecast.
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual number of data points provided
        actual: usize,
    },

    /// Invalid parameter value in a configuration.
    #[error("Invalid parameter: {parameter} = {value}, expected {constraint}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value provided
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Numerical problem with the input or an intermediate value.
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
        /// Operation that failed
        operation: Option<String>,
    },

    /// Session not found in the series store.
    #[error("Session not found: {id}")]
    SessionNotFound {
        /// Requested session id
        id: String,
    },

    /// Series batch not found in the series store.
    #[error("Series not found: {id}")]
    SeriesNotFound {
        /// Requested series id
        id: String,
    },

    /// Concurrent access error.
    #[error("Concurrent access failed: {resource}")]
    ConcurrencyError {
        /// Resource that couldn't be accessed
        resource: String,
    },

    /// Number extraction failed.
    #[error("Extraction failed: {reason}")]
    ExtractionError {
        /// Reason for the failure
        reason: String,
    },
}

/// Result type for forecasting operations.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Validates that data has sufficient length.
///
/// # Example
/// ```rust
/// use sequence_forecast::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 3).is_ok());
/// assert!(validate_data_length(&data, 5).is_err());
/// ```
pub fn validate_data_length(data: &[f64], min_required: usize) -> ForecastResult<()> {
    if data.len() < min_required {
        Err(ForecastError::InsufficientData {
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a parameter is within inclusive bounds.
pub fn validate_parameter(value: f64, min: f64, max: f64, name: &str) -> ForecastResult<()> {
    if value.is_nan() {
        return Err(ForecastError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: "must not be NaN".to_string(),
        });
    }

    if value < min || value > max {
        Err(ForecastError::InvalidParameter {
            parameter: name.to_string(),
            value,
            constraint: format!("[{}, {}]", min, max),
        })
    } else {
        Ok(())
    }
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value, naming its index and the
/// operation that received the data.
///
/// # Example
/// ```rust
/// use sequence_forecast::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0, 3.0], "history", "predict").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN, 3.0], "history", "predict").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str, operation: &str) -> ForecastResult<()> {
    if let Some((i, &value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        let value_desc = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };

        return Err(ForecastError::NumericalError {
            reason: format!(
                "{} contains non-finite value at index {}: {}",
                name, i, value_desc
            ),
            operation: Some(operation.to_string()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_data_length_exact_minimum() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(validate_data_length(&data, 3).is_ok());
    }

    #[test]
    fn test_validate_data_length_insufficient() {
        let data = vec![1.0, 2.0];
        match validate_data_length(&data, 3) {
            Err(ForecastError::InsufficientData { required, actual }) => {
                assert_eq!(required, 3);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected InsufficientData error"),
        }
    }

    #[test]
    fn test_validate_data_length_empty() {
        let result = validate_data_length(&[], 3);
        assert_eq!(
            result,
            Err(ForecastError::InsufficientData {
                required: 3,
                actual: 0
            })
        );
    }

    #[test]
    fn test_validate_parameter_bounds() {
        assert!(validate_parameter(0.0, 0.0, 1.0, "p").is_ok());
        assert!(validate_parameter(1.0, 0.0, 1.0, "p").is_ok());

        match validate_parameter(1.5, 0.0, 1.0, "threshold") {
            Err(ForecastError::InvalidParameter {
                parameter,
                value,
                constraint,
            }) => {
                assert_eq!(parameter, "threshold");
                assert_eq!(value, 1.5);
                assert_eq!(constraint, "[0, 1]");
            }
            _ => panic!("Expected InvalidParameter error"),
        }

        assert!(matches!(
            validate_parameter(f64::NAN, 0.0, 1.0, "p"),
            Err(ForecastError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_all_finite_reports_index() {
        let bad = vec![1.0, 2.0, f64::NEG_INFINITY];
        match validate_all_finite(&bad, "history", "predict") {
            Err(ForecastError::NumericalError { reason, operation }) => {
                assert_eq!(operation.as_deref(), Some("predict"));
                assert!(reason.contains("history"));
                assert!(reason.contains("index 2"));
                assert!(reason.contains("-Infinity"));
            }
            _ => panic!("Expected NumericalError"),
        }
        assert!(validate_all_finite(&[], "history", "predict").is_ok());
    }

    #[test]
    fn test_error_display_formatting() {
        let err = ForecastError::InsufficientData {
            required: 3,
            actual: 1,
        };
        let text = err.to_string();
        assert!(text.contains("Insufficient data"));
        assert!(text.contains('3'));
        assert!(text.contains('1'));

        let err = ForecastError::SessionNotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Session not found: abc");
    }
}
