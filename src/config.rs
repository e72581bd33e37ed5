//! # Predictor Configuration
//!
//! Thresholds for the deterministic rules and the parameters of the Monte
//! Carlo estimators. `Default` reproduces the production constants; the
//! presets only trade simulation accuracy for speed.

use crate::errors::{validate_parameter, ForecastError, ForecastResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Acceptance thresholds for the deterministic pattern chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternThresholds {
    /// Minimum (exclusive) R² for the arithmetic rule
    pub arithmetic_r2: f64,
    /// Minimum (exclusive) log-space R² for the geometric rule
    pub geometric_r2: f64,
    /// Minimum (exclusive) R² for the quadratic rule
    pub quadratic_r2: f64,
    /// Maximum absolute deviation from `v[i-1] + v[i-2]` for the Fibonacci rule
    pub fibonacci_tolerance: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            arithmetic_r2: 0.98,
            geometric_r2: 0.95,
            quadratic_r2: 0.98,
            fibonacci_tolerance: 0.1,
        }
    }
}

/// Parameters shared by the Monte Carlo estimators.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// Trials per estimator
    pub num_simulations: usize,
    /// Most recent observations used as the sampling pool
    pub pool_size: usize,
    /// Turns simulated by the zone-hit estimator
    pub zone_horizon: usize,
    /// Lower bound of the zone reported in the narrative
    pub zone_min: f64,
    /// Upper bound of the zone reported in the narrative
    pub zone_max: f64,
    /// Values strictly below this are calm
    pub calm_threshold: f64,
    /// Marginal probability (percent) above which a turn is flagged calm
    pub calm_flag_percent: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SimulationConfig {
    /// Production parameters: 5000 trials over the last 50 observations.
    pub fn standard() -> Self {
        Self {
            num_simulations: 5000,
            pool_size: 50,
            zone_horizon: 5,
            zone_min: 2.0,
            zone_max: 3.0,
            calm_threshold: 3.0,
            calm_flag_percent: 60.0,
        }
    }

    /// Fewer trials for interactive use; probabilities are noisier.
    pub fn quick() -> Self {
        Self {
            num_simulations: 1000,
            ..Self::standard()
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> ForecastResult<()> {
        if self.num_simulations == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "num_simulations".to_string(),
                value: 0.0,
                constraint: "must be greater than 0".to_string(),
            });
        }
        if self.pool_size == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "pool_size".to_string(),
                value: 0.0,
                constraint: "must be greater than 0".to_string(),
            });
        }
        if self.zone_horizon == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "zone_horizon".to_string(),
                value: 0.0,
                constraint: "must be greater than 0".to_string(),
            });
        }
        if self.zone_min > self.zone_max {
            return Err(ForecastError::InvalidParameter {
                parameter: "zone_min".to_string(),
                value: self.zone_min,
                constraint: format!("<= zone_max ({})", self.zone_max),
            });
        }
        validate_parameter(self.calm_flag_percent, 0.0, 100.0, "calm_flag_percent")
    }
}

/// Parameters of the GO/STOP recommendation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecommendationConfig {
    /// Values at or above this count as a hit
    pub threshold: f64,
    /// Turns ahead considered
    pub horizon: usize,
    /// Probability (percent) above which GO is issued outright
    pub go_percent: f64,
    /// Probability (percent) above which GO is issued when the gap signal fires
    pub go_with_gap_percent: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            horizon: 2,
            go_percent: 30.0,
            go_with_gap_percent: 20.0,
        }
    }
}

/// Complete configuration of a [`crate::SequencePredictor`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PredictorConfig {
    /// Deterministic rule thresholds
    pub patterns: PatternThresholds,
    /// Monte Carlo parameters
    pub simulation: SimulationConfig,
    /// Recommendation policy parameters
    pub recommendation: RecommendationConfig,
}

impl PredictorConfig {
    /// Production configuration.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Same rules, fewer simulation trials.
    pub fn quick() -> Self {
        Self {
            simulation: SimulationConfig::quick(),
            ..Self::default()
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> ForecastResult<()> {
        validate_parameter(self.patterns.arithmetic_r2, 0.0, 1.0, "arithmetic_r2")?;
        validate_parameter(self.patterns.geometric_r2, 0.0, 1.0, "geometric_r2")?;
        validate_parameter(self.patterns.quadratic_r2, 0.0, 1.0, "quadratic_r2")?;
        validate_parameter(
            self.patterns.fibonacci_tolerance,
            0.0,
            f64::MAX,
            "fibonacci_tolerance",
        )?;
        self.simulation.validate()?;
        if self.recommendation.horizon == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "horizon".to_string(),
                value: 0.0,
                constraint: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_production_constants() {
        let config = PredictorConfig::default();
        assert_eq!(config.patterns.arithmetic_r2, 0.98);
        assert_eq!(config.patterns.geometric_r2, 0.95);
        assert_eq!(config.simulation.num_simulations, 5000);
        assert_eq!(config.simulation.pool_size, 50);
        assert_eq!(config.recommendation.horizon, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quick_preset_keeps_rules() {
        let quick = PredictorConfig::quick();
        assert_eq!(quick.simulation.num_simulations, 1000);
        assert_eq!(quick.patterns, PatternThresholds::default());
        assert!(quick.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_simulation() {
        let mut config = PredictorConfig::default();
        config.simulation.num_simulations = 0;
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter { ref parameter, .. }) if parameter == "num_simulations"
        ));

        let mut config = PredictorConfig::default();
        config.simulation.zone_min = 5.0;
        assert!(config.validate().is_err());

        let mut config = PredictorConfig::default();
        config.patterns.geometric_r2 = 1.5;
        assert!(config.validate().is_err());
    }
}
