//! Sessions, stored observation batches and prediction records.
//!
//! [`SeriesStore`] is the seam to whatever persists user data; the crate ships
//! [`InMemorySeriesStore`]. Batches arrive as users paste or scan their
//! history, often re-submitting everything they already sent plus a few new
//! values, so [`assemble_batches`] folds the stored batches back into one
//! sequence without repeating overlapping runs.

use crate::errors::{ForecastError, ForecastResult};
use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Name used when a session is created without one.
pub const DEFAULT_STUDENT_NAME: &str = "Anonymous";
/// Mode used when a session is created without one.
pub const DEFAULT_MODE: &str = "EDUCATION";

/// A user session owning series batches and prediction records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Session {
    /// Unique id
    pub id: String,
    /// Display name
    pub student_name: String,
    /// Free-form mode tag
    pub mode: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// How a batch was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum SeriesSource {
    /// Parsed from page markup
    Html,
    /// Read from a screenshot
    Ocr,
    /// Typed by the user
    Manual,
}

/// One stored batch of observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SeriesEntry {
    /// Unique id
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Observations in capture order
    pub numbers: Vec<f64>,
    /// Capture channel
    pub source: SeriesSource,
    /// `numbers.len()`
    pub count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One page of a session's batches, newest first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SeriesPage {
    /// Batches on this page
    pub series: Vec<SeriesEntry>,
    /// Batches in the session
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    /// `ceil(total / limit)`
    pub total_pages: usize,
}

/// A prediction made for a session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PredictionRecord {
    /// Owning session
    pub session_id: String,
    /// History the prediction was made from
    pub input_values: Vec<f64>,
    /// Whether a deterministic rule matched
    pub is_deterministic: bool,
    /// Reported confidence
    pub confidence: f64,
    /// Forecast values
    pub predicted_values: [f64; 3],
}

/// Persistence for sessions, batches and prediction records.
///
/// Every session-scoped operation fails with `SessionNotFound` for an
/// unknown session id.
pub trait SeriesStore {
    /// Create a session; `None` or empty arguments take the defaults.
    fn create_session(
        &self,
        student_name: Option<&str>,
        mode: Option<&str>,
    ) -> ForecastResult<Session>;

    /// Look a session up.
    fn session(&self, id: &str) -> ForecastResult<Session>;

    /// Store a batch.
    fn save_series(
        &self,
        session_id: &str,
        numbers: Vec<f64>,
        source: SeriesSource,
    ) -> ForecastResult<SeriesEntry>;

    /// Batches of a session, newest first, `limit` per 1-based `page`.
    fn session_series(
        &self,
        session_id: &str,
        page: usize,
        limit: usize,
    ) -> ForecastResult<SeriesPage>;

    /// Every batch of a session, oldest first.
    fn all_series(&self, session_id: &str) -> ForecastResult<Vec<SeriesEntry>>;

    /// Remove a batch by id.
    fn delete_series(&self, id: &str) -> ForecastResult<()>;

    /// Store a prediction record.
    fn record_prediction(&self, record: PredictionRecord) -> ForecastResult<()>;

    /// Prediction records of a session, oldest first.
    fn predictions(&self, session_id: &str) -> ForecastResult<Vec<PredictionRecord>>;

    /// True when `numbers` equals the newest stored batch exactly.
    fn is_duplicate_of_latest(&self, session_id: &str, numbers: &[f64]) -> ForecastResult<bool> {
        Ok(self
            .all_series(session_id)?
            .last()
            .is_some_and(|latest| latest.numbers == numbers))
    }

    /// Store a batch unless it repeats the newest one. Returns `None` for a
    /// duplicate.
    fn save_if_new(
        &self,
        session_id: &str,
        numbers: Vec<f64>,
        source: SeriesSource,
    ) -> ForecastResult<Option<SeriesEntry>> {
        if self.is_duplicate_of_latest(session_id, &numbers)? {
            log::debug!("Skipping duplicate batch for session {}", session_id);
            return Ok(None);
        }
        self.save_series(session_id, numbers, source).map(Some)
    }

    /// The session's full history, see [`assemble_batches`].
    fn session_numbers(&self, session_id: &str) -> ForecastResult<Vec<f64>> {
        let series = self.all_series(session_id)?;
        let batches: Vec<&[f64]> = series.iter().map(|s| s.numbers.as_slice()).collect();
        Ok(assemble_batches(&batches))
    }
}

/// True when `needle` occurs as a contiguous run inside `haystack`. An empty
/// needle occurs everywhere.
pub fn is_contiguous_subsequence(needle: &[f64], haystack: &[f64]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Concatenate batches (given oldest first) into one history.
///
/// Batches are examined newest first; a batch that appears as a contiguous
/// run inside a batch already kept is dropped. The kept batches are then
/// concatenated oldest first.
pub fn assemble_batches(batches: &[&[f64]]) -> Vec<f64> {
    let mut kept: Vec<&[f64]> = Vec::with_capacity(batches.len());
    for &batch in batches.iter().rev() {
        if !kept.iter().any(|k| is_contiguous_subsequence(batch, k)) {
            kept.push(batch);
        }
    }
    kept.iter().rev().flat_map(|b| b.iter().copied()).collect()
}

#[derive(Debug, Default)]
struct StoreState {
    sessions: Vec<Session>,
    // insertion order is chronological order
    series: Vec<SeriesEntry>,
    predictions: Vec<PredictionRecord>,
}

impl StoreState {
    fn require_session(&self, id: &str) -> ForecastResult<&Session> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ForecastError::SessionNotFound { id: id.to_string() })
    }
}

/// Thread-safe in-process store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemorySeriesStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ForecastResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| ForecastError::ConcurrencyError {
            resource: "series_store".to_string(),
        })
    }

    fn write(&self) -> ForecastResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| ForecastError::ConcurrencyError {
            resource: "series_store".to_string(),
        })
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(default)
}

impl SeriesStore for InMemorySeriesStore {
    fn create_session(
        &self,
        student_name: Option<&str>,
        mode: Option<&str>,
    ) -> ForecastResult<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            student_name: non_empty_or(student_name, DEFAULT_STUDENT_NAME).to_string(),
            mode: non_empty_or(mode, DEFAULT_MODE).to_string(),
            created_at: Utc::now(),
        };
        self.write()?.sessions.push(session.clone());
        Ok(session)
    }

    fn session(&self, id: &str) -> ForecastResult<Session> {
        self.read()?.require_session(id).cloned()
    }

    fn save_series(
        &self,
        session_id: &str,
        numbers: Vec<f64>,
        source: SeriesSource,
    ) -> ForecastResult<SeriesEntry> {
        let mut state = self.write()?;
        state.require_session(session_id)?;
        let entry = SeriesEntry {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            count: numbers.len(),
            numbers,
            source,
            created_at: Utc::now(),
        };
        state.series.push(entry.clone());
        Ok(entry)
    }

    fn session_series(
        &self,
        session_id: &str,
        page: usize,
        limit: usize,
    ) -> ForecastResult<SeriesPage> {
        if page == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "page".to_string(),
                value: 0.0,
                constraint: "must be at least 1".to_string(),
            });
        }
        if limit == 0 {
            return Err(ForecastError::InvalidParameter {
                parameter: "limit".to_string(),
                value: 0.0,
                constraint: "must be at least 1".to_string(),
            });
        }

        let state = self.read()?;
        state.require_session(session_id)?;
        let newest_first: Vec<&SeriesEntry> = state
            .series
            .iter()
            .rev()
            .filter(|s| s.session_id == session_id)
            .collect();
        let total = newest_first.len();
        let series = newest_first
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        Ok(SeriesPage {
            series,
            total,
            page,
            total_pages: total.div_ceil(limit),
        })
    }

    fn all_series(&self, session_id: &str) -> ForecastResult<Vec<SeriesEntry>> {
        let state = self.read()?;
        state.require_session(session_id)?;
        Ok(state
            .series
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect())
    }

    fn delete_series(&self, id: &str) -> ForecastResult<()> {
        let mut state = self.write()?;
        let position = state
            .series
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| {
                log::warn!("Delete requested for unknown series {}", id);
                ForecastError::SeriesNotFound { id: id.to_string() }
            })?;
        state.series.remove(position);
        Ok(())
    }

    fn record_prediction(&self, record: PredictionRecord) -> ForecastResult<()> {
        let mut state = self.write()?;
        state.require_session(&record.session_id)?;
        state.predictions.push(record);
        Ok(())
    }

    fn predictions(&self, session_id: &str) -> ForecastResult<Vec<PredictionRecord>> {
        let state = self.read()?;
        state.require_session(session_id)?;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect())
    }
}
