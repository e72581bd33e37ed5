//! # Sequence Forecast
//!
//! Pattern detection and short-term forecasting for numeric observation
//! sequences.
//!
//! Given an ordered history of at least three observations, the engine first
//! checks whether the sequence follows a deterministic generative rule
//! (arithmetic, geometric, quadratic or a Fibonacci-like recurrence) and, if
//! so, extrapolates it exactly. Otherwise the sequence is treated as
//! stochastic: order statistics, a momentum state and an empirical transition
//! estimate give a forecast and interval, and seeded Monte Carlo resampling of
//! the recent history drives a zone-hit narrative, a peak estimate, a GO/STOP
//! recommendation and a calm-zone estimate.
//!
//! ## Key Features
//!
//! - **Deterministic Rules**: Closed-form least-squares fits scored by R², tried in a fixed priority order
//! - **Robust Fallback**: Quartile interval, EMA and median forecast, RSI-style momentum, three-state transition counts
//! - **Reproducible Simulation**: Every stochastic step draws from an injected ChaCha20 stream
//! - **Collaborators**: In-memory session and series store with batch de-duplication, number extraction from markup and recognised words
//!
//! ## Quick Start
//!
//! ```rust
//! use sequence_forecast::{PatternType, SequencePredictor};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let predictor = SequencePredictor::new();
//!
//!     let result = predictor.predict_seeded(&[2.0, 4.0, 8.0, 16.0, 32.0], 7)?;
//!     assert_eq!(result.pattern_type, PatternType::Geometric);
//!
//!     let history = [1.2, 3.4, 1.05, 8.8, 2.2, 1.9, 14.0, 1.3, 2.6, 11.5, 1.1, 4.2];
//!     let result = predictor.predict_seeded(&history, 7)?;
//!     if let Some(rec) = &result.recommendation {
//!         println!("{:?} ({:.1}%): {}", rec.action, rec.confidence, rec.reason);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! [`SequencePredictor`] orchestrates the analysis modules, each of which can
//! also be used directly. [`PredictionService`] adds the request boundary and
//! persistence through any [`SeriesStore`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod math_utils;
pub mod results;
pub mod secure_rng;

// Analysis methods
pub mod monte_carlo;
pub mod patterns;
pub mod peaks;
pub mod predictor;
pub mod recommendation;
pub mod regression;
pub mod robust_stats;

// Collaborators
pub mod extraction;
pub mod series;
pub mod service;

// Re-exports for convenience - main public API
pub use config::{PatternThresholds, PredictorConfig, RecommendationConfig, SimulationConfig};
pub use errors::{ForecastError, ForecastResult};
pub use predictor::SequencePredictor;
pub use results::{
    Action, CalmAnalysis, Interval, PatternType, PeakAnalysis, PredictionResult, Recommendation,
    TurnCalm,
};
pub use secure_rng::{ReplaySource, SecureRng, UniformSource};
pub use series::{
    InMemorySeriesStore, PredictionRecord, SeriesEntry, SeriesPage, SeriesSource, SeriesStore,
    Session,
};
pub use service::{PredictRequest, PredictionService};
