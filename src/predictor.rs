//! # Sequence Predictor
//!
//! [`SequencePredictor`] is the engine's entry point. A call first runs the
//! deterministic rule chain; when no rule accepts the history it falls back
//! to the robust statistical analysis and enriches that result, in order,
//! with the zone-hit narrative, peak analysis, the GO/STOP recommendation
//! and the calm-zone estimate. Every stochastic step draws from the one
//! random source passed to [`SequencePredictor::predict`].
//!
//! ## Usage Example
//!
//! ```rust
//! use sequence_forecast::{PatternType, SequencePredictor};
//!
//! # fn main() -> Result<(), sequence_forecast::ForecastError> {
//! let predictor = SequencePredictor::new();
//! let result = predictor.predict_seeded(&[1.0, 2.0, 3.0, 4.0, 5.0], 42)?;
//! assert_eq!(result.pattern_type, PatternType::Arithmetic);
//! assert_eq!(result.next_values, [6.0, 7.0, 8.0]);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::PredictorConfig,
    errors::{validate_all_finite, validate_data_length, ForecastResult},
    monte_carlo::{calm_zone_analysis, zone_hit_summary},
    patterns::detect_pattern,
    peaks::peak_analysis,
    recommendation::recommend,
    results::PredictionResult,
    robust_stats,
    secure_rng::{SecureRng, UniformSource},
};

/// Fewest observations the engine accepts.
pub const MIN_HISTORY: usize = 3;

/// Stateless forecasting engine. Holding one across calls only shares the
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct SequencePredictor {
    config: PredictorConfig,
}

impl SequencePredictor {
    /// Predictor with the standard configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Predictor with a validated custom configuration.
    pub fn with_config(config: PredictorConfig) -> ForecastResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Forecast the next three values of `history`.
    ///
    /// Fails with `InsufficientData` below [`MIN_HISTORY`] observations and
    /// with `NumericalError` when any observation is NaN or infinite.
    pub fn predict<R: UniformSource + ?Sized>(
        &self,
        history: &[f64],
        rng: &mut R,
    ) -> ForecastResult<PredictionResult> {
        validate_data_length(history, MIN_HISTORY)?;
        validate_all_finite(history, "history", "predict")?;

        if let Some(m) = detect_pattern(history, &self.config.patterns) {
            return Ok(PredictionResult::deterministic(
                m.pattern_type,
                m.next_values,
                m.confidence,
            ));
        }

        log::debug!(
            "No deterministic rule matched {} observations; running robust analysis",
            history.len()
        );

        let simulation = &self.config.simulation;
        let mut result = robust_stats::analyze(history);
        result.monte_carlo = Some(zone_hit_summary(history, simulation, rng));
        result.peak_analysis = Some(peak_analysis(history));
        result.recommendation = Some(recommend(
            history,
            &self.config.recommendation,
            simulation,
            rng,
        ));
        result.calm_analysis = Some(calm_zone_analysis(history, simulation, rng));

        #[cfg(feature = "debug_logging")]
        log::debug!("Prediction result: {:?}", result);

        Ok(result)
    }

    /// [`predict`](Self::predict) with a ChaCha20 stream seeded from `seed`.
    pub fn predict_seeded(&self, history: &[f64], seed: u64) -> ForecastResult<PredictionResult> {
        self.predict(history, &mut SecureRng::with_seed(seed))
    }

    /// [`predict`](Self::predict) with a ChaCha20 stream seeded from OS
    /// entropy.
    pub fn predict_entropy(&self, history: &[f64]) -> ForecastResult<PredictionResult> {
        self.predict(history, &mut SecureRng::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ForecastError,
        results::{Action, PatternType},
    };

    #[test]
    fn test_rejects_short_history() {
        let predictor = SequencePredictor::new();
        let err = predictor.predict_seeded(&[1.0, 2.0], 1).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientData {
                required: 3,
                actual: 2
            }
        );
        assert!(predictor.predict_seeded(&[], 1).is_err());
    }

    #[test]
    fn test_rejects_non_finite_history() {
        let predictor = SequencePredictor::new();
        let err = predictor
            .predict_seeded(&[1.0, f64::NAN, 3.0], 1)
            .unwrap_err();
        match err {
            ForecastError::NumericalError { operation, .. } => {
                assert_eq!(operation.as_deref(), Some("predict"));
            }
            other => panic!("Expected NumericalError, got {:?}", other),
        }
    }

    #[test]
    fn test_deterministic_result_has_no_sections() {
        let result = SequencePredictor::new()
            .predict_seeded(&[3.0, 6.0, 9.0, 12.0], 0)
            .unwrap();
        assert!(result.is_deterministic);
        assert_eq!(result.pattern_type, PatternType::Arithmetic);
        assert!(result.interval.is_none());
        assert!(result.monte_carlo.is_none());
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_fallback_populates_every_section() {
        let history = [1.2, 3.4, 1.05, 8.8, 2.2, 1.9, 14.0, 1.3, 2.6, 11.5, 1.1, 4.2];
        let result = SequencePredictor::new().predict_seeded(&history, 7).unwrap();
        assert!(!result.is_deterministic);
        assert_eq!(result.pattern_type, PatternType::Random);
        let interval = result.interval.unwrap();
        assert!(interval.min <= interval.max);
        assert!(result.monte_carlo.is_some());
        assert!(result.peak_analysis.is_some());
        assert!(result.calm_analysis.is_some());
        let rec = result.recommendation.unwrap();
        assert!(matches!(rec.action, Action::Go | Action::Stop));
        assert!((0.0..=100.0).contains(&rec.confidence));
    }

    #[test]
    fn test_custom_config_is_validated() {
        let mut config = PredictorConfig::quick();
        config.simulation.pool_size = 0;
        assert!(SequencePredictor::with_config(config).is_err());

        let predictor = SequencePredictor::with_config(PredictorConfig::quick()).unwrap();
        assert_eq!(predictor.config().simulation.num_simulations, 1000);
    }

    #[test]
    fn test_same_seed_same_result() {
        let history = [1.2, 3.4, 1.05, 8.8, 2.2, 1.9, 14.0, 1.3, 2.6, 11.5, 1.1, 4.2];
        let predictor = SequencePredictor::new();
        let a = predictor.predict_seeded(&history, 21).unwrap();
        let b = predictor.predict_seeded(&history, 21).unwrap();
        assert_eq!(a, b);
    }
}
