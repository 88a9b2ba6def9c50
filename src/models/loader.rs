//! Startup gate: read the model artifact from disk.
//!
//! There are no retries. If the artifact is missing or unusable the caller
//! reports the error and exits before any UI is shown.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::error::AppError;
use crate::models::model::{ModelArtifact, TrainedModel};
use crate::models::predictor::Predictor;

/// Where the model artifact is expected, relative to the working directory.
pub const MODEL_PATH: &str = "solar_model.json";

/// Startup-fatal model errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file '{}' not found. Please upload it.", path.display())]
    NotFound { path: PathBuf },
    #[error("Error loading model: {cause}")]
    Load { path: PathBuf, cause: String },
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::new(3, err.to_string())
    }
}

/// Load and validate the artifact at `path`.
pub fn load_model(path: &Path) -> Result<TrainedModel, ModelError> {
    if !path.exists() {
        tracing::error!(path = %path.display(), "model artifact not found");
        return Err(ModelError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let load_err = |cause: String| {
        tracing::error!(path = %path.display(), %cause, "model artifact rejected");
        ModelError::Load {
            path: path.to_path_buf(),
            cause,
        }
    };

    let raw = fs::read_to_string(path)
        .map_err(|e| load_err(format!("failed to read '{}': {e}", path.display())))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&raw).map_err(|e| load_err(format!("invalid model JSON: {e}")))?;
    let model = TrainedModel::from_artifact(artifact).map_err(|e| load_err(e.to_string()))?;

    info!(
        path = %path.display(),
        model = %model.describe(),
        n_features = model.n_features(),
        "model loaded"
    );
    Ok(model)
}

/// Load the artifact from [`MODEL_PATH`].
pub fn load_default_model() -> Result<TrainedModel, ModelError> {
    load_model(Path::new(MODEL_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::domain::FEATURE_COUNT;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar_model.json");
        let err = load_model(&path).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("not found"), "{msg}");
        assert!(msg.contains("solar_model.json"));

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 3);
    }

    #[test]
    fn corrupt_file_is_a_load_error_with_cause() {
        let file = write_artifact("{ this is not json");
        let err = load_model(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::Load { .. }));
        assert!(err.to_string().starts_with("Error loading model: invalid model JSON"));
    }

    #[test]
    fn unknown_model_kind_is_a_load_error() {
        let file = write_artifact(r#"{ "kind": "svm", "support_vectors": [] }"#);
        let err = load_model(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::Load { .. }));
    }

    #[test]
    fn structurally_invalid_artifact_is_a_load_error() {
        let file = write_artifact(r#"{ "kind": "forest", "n_features": 12, "trees": [] }"#);
        let err = load_model(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "Error loading model: model has no trees");
    }

    #[test]
    fn valid_artifact_loads() {
        let coefficients = vec!["0.5"; FEATURE_COUNT].join(", ");
        let file = write_artifact(&format!(
            r#"{{ "kind": "linear", "name": "solar-lr", "intercept": 1.0, "coefficients": [{coefficients}] }}"#
        ));
        let model = load_model(file.path()).unwrap();
        assert_eq!(model.n_features(), FEATURE_COUNT);
        assert_eq!(model.name(), Some("solar-lr"));
        assert!(model.describe().starts_with("solar-lr (linear"));
    }
}
