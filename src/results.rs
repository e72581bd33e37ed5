//! # Prediction Result Structures
//!
//! The engine's single output type and its optional sub-structures. Each
//! optional section is independently present or absent; with the `serde`
//! feature the layout serializes with camelCase keys and upper-case tags.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of the input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum PatternType {
    /// Constant step
    Arithmetic,
    /// Constant ratio
    Geometric,
    /// Degree-2 polynomial
    Quadratic,
    /// Each value is the sum of the two before it
    Fibonacci,
    /// No deterministic rule matched
    Random,
}

impl PatternType {
    /// True for every tag produced by a deterministic rule.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, PatternType::Random)
    }
}

/// Forecast interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

/// Imminent-peak estimate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakAnalysis {
    /// Probability in percent, 0 to 99
    pub probability: f64,
    /// Commentary
    pub text: String,
}

/// Recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Action {
    /// Act now
    Go,
    /// Wait
    Stop,
}

/// GO/STOP decision with its confidence (percent) and reason.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Recommendation {
    /// Decision
    pub action: Action,
    /// Confidence in percent
    pub confidence: f64,
    /// Human-readable justification
    pub reason: String,
}

/// Calm estimate for one simulated turn.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TurnCalm {
    /// Marginal probability above the calm flag
    pub is_calm: bool,
    /// Marginal probability in percent
    pub probability: f64,
}

/// Calm-zone estimate for the next two turns.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CalmAnalysis {
    /// First turn
    pub turn1: TurnCalm,
    /// Second turn
    pub turn2: TurnCalm,
    /// Probability in percent that both turns are calm
    pub global_probability: f64,
}

impl CalmAnalysis {
    /// Neutral value used when there is nothing to sample from.
    pub fn neutral() -> Self {
        let turn = TurnCalm {
            is_calm: false,
            probability: 0.0,
        };
        Self {
            turn1: turn,
            turn2: turn,
            global_probability: 0.0,
        }
    }
}

/// The engine's output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PredictionResult {
    /// Forecast for the next three positions
    pub next_values: [f64; 3],
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// True when a deterministic rule matched
    pub is_deterministic: bool,
    /// Classification
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub pattern_type: PatternType,
    /// Forecast interval
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub interval: Option<Interval>,
    /// Accumulated risk warnings
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub warning: Option<String>,
    /// Zone-hit narrative
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub monte_carlo: Option<String>,
    /// Imminent-peak estimate
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub peak_analysis: Option<PeakAnalysis>,
    /// GO/STOP decision
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub recommendation: Option<Recommendation>,
    /// Calm-zone estimate
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub calm_analysis: Option<CalmAnalysis>,
}

impl PredictionResult {
    /// Result of a deterministic rule: no optional sections.
    pub fn deterministic(pattern_type: PatternType, next_values: [f64; 3], confidence: f64) -> Self {
        Self {
            next_values,
            confidence: confidence.clamp(0.0, 1.0),
            is_deterministic: pattern_type.is_deterministic(),
            pattern_type,
            interval: None,
            warning: None,
            monte_carlo: None,
            peak_analysis: None,
            recommendation: None,
            calm_analysis: None,
        }
    }

    /// Append a warning, separating it from earlier ones by a space.
    pub fn push_warning(&mut self, text: &str) {
        if let Some(warning) = self.warning.as_mut().filter(|w| !w.is_empty()) {
            warning.push(' ');
            warning.push_str(text);
        } else {
            self.warning = Some(text.to_string());
        }
    }
}
