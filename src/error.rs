use thiserror::Error;

/// Conditions raised inside the prediction pipeline.
///
/// Only `InvalidRequest` is returned from [`crate::engine::Predictor::predict`];
/// the remaining variants are reported by sub-components and recovered by the
/// engine's fallback paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("no head-to-head data for {home} vs {away}")]
    NoHistoricalData { home: String, away: String },

    #[error("invalid probability vector: {0}")]
    InvalidProbabilityVector(String),

    #[error("ambiguous result encoding: {0}")]
    AmbiguousEncoding(String),
}
