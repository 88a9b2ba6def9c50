//! The inference seam between the pipeline and a trained model.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Why a prediction call failed.
///
/// Callers match on the variant rather than on message text: a shape mismatch
/// means the loaded model cannot serve this form at all, while a numeric-domain
/// failure may go away with different inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("X has {got} features, but the model is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("model produced a non-finite output ({value}) for row {row}")]
    NonFinite { row: usize, value: f64 },
    #[error("model returned no output")]
    EmptyOutput,
    #[error("{0}")]
    Internal(String),
}

impl PredictError {
    /// Whether adjusting the inputs and retrying can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PredictError::NonFinite { .. })
    }
}

/// A trained regressor mapping input rows to one output per row.
///
/// Implementations are loaded once and never mutated afterwards.
pub trait Predictor: Send + Sync {
    /// Short human-readable description (model kind and size).
    fn describe(&self) -> String;

    /// Predict one value per row of `batch`.
    fn predict(&self, batch: &DMatrix<f64>) -> Result<DVector<f64>, PredictError>;
}
