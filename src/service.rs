//! Request boundary tying the predictor to a [`SeriesStore`].

use crate::{
    errors::ForecastResult,
    predictor::SequencePredictor,
    results::PredictionResult,
    secure_rng::{SecureRng, UniformSource},
    series::{PredictionRecord, SeriesStore},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Incoming prediction request.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PredictRequest {
    /// Observations, oldest first
    pub history: Vec<f64>,
    /// Session to record the prediction under
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub session_id: Option<String>,
}

/// Predictor plus store.
#[derive(Debug, Clone)]
pub struct PredictionService<S: SeriesStore> {
    predictor: SequencePredictor,
    store: S,
}

impl<S: SeriesStore> PredictionService<S> {
    /// Service with the standard predictor.
    pub fn new(store: S) -> Self {
        Self::with_predictor(SequencePredictor::new(), store)
    }

    /// Service with a configured predictor.
    pub fn with_predictor(predictor: SequencePredictor, store: S) -> Self {
        Self { predictor, store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Predict from the request history with OS entropy, recording the result
    /// when the request names a session.
    pub fn handle(&self, request: &PredictRequest) -> ForecastResult<PredictionResult> {
        self.handle_with(request, &mut SecureRng::new())
    }

    /// [`handle`](Self::handle) with an explicit random source.
    pub fn handle_with<R: UniformSource + ?Sized>(
        &self,
        request: &PredictRequest,
        rng: &mut R,
    ) -> ForecastResult<PredictionResult> {
        let result = self.predictor.predict(&request.history, rng)?;
        if let Some(session_id) = request.session_id.as_deref().filter(|id| !id.is_empty()) {
            self.record(session_id, &request.history, &result)?;
        }
        Ok(result)
    }

    /// Predict from the assembled history of a stored session and record the
    /// result.
    pub fn predict_session<R: UniformSource + ?Sized>(
        &self,
        session_id: &str,
        rng: &mut R,
    ) -> ForecastResult<PredictionResult> {
        let history = self.store.session_numbers(session_id)?;
        let result = self.predictor.predict(&history, rng)?;
        self.record(session_id, &history, &result)?;
        Ok(result)
    }

    fn record(
        &self,
        session_id: &str,
        history: &[f64],
        result: &PredictionResult,
    ) -> ForecastResult<()> {
        self.store.record_prediction(PredictionRecord {
            session_id: session_id.to_string(),
            input_values: history.to_vec(),
            is_deterministic: result.is_deterministic,
            confidence: result.confidence,
            predicted_values: result.next_values,
        })
    }
}
