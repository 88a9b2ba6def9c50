//! Portable model artifact and its evaluation.
//!
//! The artifact is a JSON document written by the training side. It carries
//! either a linear model or a tree ensemble, using the flat parallel-array tree
//! layout common to scikit-learn style exporters:
//!
//! ```json
//! {
//!   "kind": "forest",
//!   "name": "solar-rf",
//!   "features": ["distance_to_solar_noon", "temperature", "..."],
//!   "trees": [
//!     { "children_left": [1, -1, -1], "children_right": [2, -1, -1],
//!       "feature": [0, -2, -2], "threshold": [1.2, 0.0, 0.0],
//!       "value": [0.0, 2400.0, 800.0] }
//!   ]
//! }
//! ```
//!
//! Structural problems are rejected when the artifact is loaded. An input width
//! that differs from the form's is not: it surfaces on the first prediction as a
//! shape mismatch.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FEATURE_COUNT, InputField};
use crate::models::predictor::{PredictError, Predictor};

/// Child index marking a leaf node.
pub const LEAF: i64 = -1;

/// A serialized model as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Training column names. When present they must match the form's column
    /// order exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    /// Expected input width. Required for tree models without `features`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(flatten)]
    pub body: ModelBody,
}

/// Model family and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelBody {
    /// `y = intercept + Σ coefficients[i] * x[i]`
    Linear { intercept: f64, coefficients: Vec<f64> },
    /// Mean of the tree outputs.
    Forest { trees: Vec<Tree> },
    /// `y = init + learning_rate * Σ tree(x)`
    Boosted {
        init: f64,
        learning_rate: f64,
        trees: Vec<Tree>,
    },
}

/// A regression tree in flat array form. Node 0 is the root.
///
/// A node whose children are both [`LEAF`] is a leaf and returns `value`.
/// Otherwise rows with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

/// Structural problem in an artifact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("artifact lists {got} feature names, expected {expected}")]
    FeatureCount { expected: usize, got: usize },
    #[error("feature column {index} is '{found}', expected '{expected}'")]
    FeatureOrder {
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("n_features is {declared} but the artifact lists {listed} feature names")]
    WidthConflict { declared: usize, listed: usize },
    #[error("linear model has {got} coefficients but declares {expected} features")]
    CoefficientCount { expected: usize, got: usize },
    #[error("tree models must declare `n_features` or `features`")]
    MissingWidth,
    #[error("model has no {0}")]
    Empty(&'static str),
    #[error("non-finite {0}")]
    NonFinite(&'static str),
    #[error("tree {tree}: {reason}")]
    Tree { tree: usize, reason: String },
}

impl Tree {
    fn validate(&self, width: usize) -> Result<(), String> {
        let n = self.value.len();
        if n == 0 {
            return Err("no nodes".to_string());
        }
        if self.children_left.len() != n
            || self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
        {
            return Err(format!(
                "node arrays differ in length (left={}, right={}, feature={}, threshold={}, value={n})",
                self.children_left.len(),
                self.children_right.len(),
                self.feature.len(),
                self.threshold.len(),
            ));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            match (left == LEAF, right == LEAF) {
                (true, true) => {
                    if !self.value[node].is_finite() {
                        return Err(format!("leaf {node} has a non-finite value"));
                    }
                }
                (false, false) => {
                    // Children must come after their parent, which also rules
                    // out cycles during evaluation.
                    for child in [left, right] {
                        if child <= node as i64 || child >= n as i64 {
                            return Err(format!("node {node} has invalid child index {child}"));
                        }
                    }
                    let feature = self.feature[node];
                    if feature < 0 || feature as usize >= width {
                        return Err(format!(
                            "node {node} splits on feature {feature}, model width is {width}"
                        ));
                    }
                    if !self.threshold[node].is_finite() {
                        return Err(format!("node {node} has a non-finite threshold"));
                    }
                }
                _ => return Err(format!("node {node} has exactly one child")),
            }
        }
        Ok(())
    }

    /// Evaluate the tree on one row. The row must be at least as wide as the
    /// model; `validate` guarantees termination.
    fn eval(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return self.value[node];
            }
            let x = row[self.feature[node] as usize];
            node = if x <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// A validated, ready-to-serve model.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    name: Option<String>,
    n_features: usize,
    body: ModelBody,
}

impl TrainedModel {
    /// Validate an artifact and freeze it for inference.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        if let Some(names) = &artifact.features {
            check_feature_names(names)?;
        }

        let listed = artifact.features.as_ref().map(Vec::len);
        if let (Some(declared), Some(listed)) = (artifact.n_features, listed) {
            if declared != listed {
                return Err(ArtifactError::WidthConflict { declared, listed });
            }
        }
        let declared_width = artifact.n_features.or(listed);

        let n_features = match &artifact.body {
            ModelBody::Linear {
                intercept,
                coefficients,
            } => {
                if coefficients.is_empty() {
                    return Err(ArtifactError::Empty("coefficients"));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::NonFinite("linear coefficient"));
                }
                if let Some(expected) = declared_width {
                    if expected != coefficients.len() {
                        return Err(ArtifactError::CoefficientCount {
                            expected,
                            got: coefficients.len(),
                        });
                    }
                }
                coefficients.len()
            }
            ModelBody::Forest { trees } => {
                let width = declared_width.ok_or(ArtifactError::MissingWidth)?;
                validate_trees(trees, width)?;
                width
            }
            ModelBody::Boosted {
                init,
                learning_rate,
                trees,
            } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err(ArtifactError::NonFinite("boosting init or learning_rate"));
                }
                let width = declared_width.ok_or(ArtifactError::MissingWidth)?;
                validate_trees(trees, width)?;
                width
            }
        };

        Ok(Self {
            name: artifact.name,
            n_features,
            body: artifact.body,
        })
    }

    /// Input width the model was trained on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn kind_summary(&self) -> String {
        match &self.body {
            ModelBody::Linear { coefficients, .. } => {
                format!("linear, {} coefficients", coefficients.len())
            }
            ModelBody::Forest { trees } => format!("forest, {} trees", trees.len()),
            ModelBody::Boosted {
                trees,
                learning_rate,
                ..
            } => format!("boosted, {} trees, lr={learning_rate}", trees.len()),
        }
    }
}

impl Predictor for TrainedModel {
    fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({})", self.kind_summary()),
            None => self.kind_summary(),
        }
    }

    fn predict(&self, batch: &DMatrix<f64>) -> Result<DVector<f64>, PredictError> {
        if batch.ncols() != self.n_features {
            return Err(PredictError::ShapeMismatch {
                expected: self.n_features,
                got: batch.ncols(),
            });
        }

        let out = match &self.body {
            ModelBody::Linear {
                intercept,
                coefficients,
            } => {
                let weights = DVector::from_column_slice(coefficients);
                (batch * weights).add_scalar(*intercept)
            }
            ModelBody::Forest { trees } => {
                let scale = 1.0 / trees.len() as f64;
                DVector::from_fn(batch.nrows(), |r, _| {
                    let row = row_values(batch, r);
                    trees.iter().map(|t| t.eval(&row)).sum::<f64>() * scale
                })
            }
            ModelBody::Boosted {
                init,
                learning_rate,
                trees,
            } => DVector::from_fn(batch.nrows(), |r, _| {
                let row = row_values(batch, r);
                init + learning_rate * trees.iter().map(|t| t.eval(&row)).sum::<f64>()
            }),
        };

        if let Some((row, value)) = out.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PredictError::NonFinite { row, value: *value });
        }
        Ok(out)
    }
}

fn check_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != FEATURE_COUNT {
        return Err(ArtifactError::FeatureCount {
            expected: FEATURE_COUNT,
            got: names.len(),
        });
    }
    for (index, (name, field)) in names.iter().zip(InputField::ALL).enumerate() {
        if name != field.key() {
            return Err(ArtifactError::FeatureOrder {
                index,
                expected: field.key(),
                found: name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_trees(trees: &[Tree], width: usize) -> Result<(), ArtifactError> {
    if trees.is_empty() {
        return Err(ArtifactError::Empty("trees"));
    }
    for (idx, tree) in trees.iter().enumerate() {
        tree.validate(width)
            .map_err(|reason| ArtifactError::Tree { tree: idx, reason })?;
    }
    Ok(())
}

fn row_values(batch: &DMatrix<f64>, r: usize) -> Vec<f64> {
    batch.row(r).iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical_names() -> Vec<String> {
        InputField::ALL.iter().map(|f| f.key().to_string()).collect()
    }

    fn parse(value: serde_json::Value) -> ModelArtifact {
        serde_json::from_value(value).unwrap()
    }

    /// Split on temperature (column 1) at 20.0: cold -> 1.0, warm -> 3.0.
    fn stump() -> serde_json::Value {
        json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [1, -2, -2],
            "threshold": [20.0, 0.0, 0.0],
            "value": [0.0, 1.0, 3.0]
        })
    }

    fn row_with_temperature(t: f64) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(1, FEATURE_COUNT);
        m[(0, 1)] = t;
        m
    }

    #[test]
    fn linear_model_predicts_dot_product_plus_intercept() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = 2.0;
        coefficients[11] = -1.0;
        let model = TrainedModel::from_artifact(parse(json!({
            "kind": "linear",
            "intercept": 10.0,
            "coefficients": coefficients
        })))
        .unwrap();

        let mut batch = DMatrix::zeros(2, FEATURE_COUNT);
        batch[(0, 0)] = 1.5;
        batch[(0, 11)] = 4.0;
        batch[(1, 0)] = 3.0;
        let out = model.predict(&batch).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0] - 9.0).abs() < 1e-12);
        assert!((out[1] - 16.0).abs() < 1e-12);
        assert_eq!(model.n_features(), FEATURE_COUNT);
    }

    #[test]
    fn forest_averages_trees() {
        let model = TrainedModel::from_artifact(parse(json!({
            "kind": "forest",
            "n_features": FEATURE_COUNT,
            "trees": [stump(), {
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [0.0],
                "value": [5.0]
            }]
        })))
        .unwrap();

        let cold = model.predict(&row_with_temperature(10.0)).unwrap();
        let warm = model.predict(&row_with_temperature(30.0)).unwrap();
        assert!((cold[0] - 3.0).abs() < 1e-12);
        assert!((warm[0] - 4.0).abs() < 1e-12);
        // Split rule is `<=`.
        let edge = model.predict(&row_with_temperature(20.0)).unwrap();
        assert!((edge[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn boosted_applies_init_and_learning_rate() {
        let model = TrainedModel::from_artifact(parse(json!({
            "kind": "boosted",
            "features": canonical_names(),
            "init": 100.0,
            "learning_rate": 0.5,
            "trees": [stump(), stump()]
        })))
        .unwrap();

        let warm = model.predict(&row_with_temperature(25.0)).unwrap();
        assert!((warm[0] - 103.0).abs() < 1e-12);
        assert!(model.describe().contains("boosted, 2 trees"));
    }

    #[test]
    fn width_mismatch_is_reported_at_prediction_time() {
        let model = TrainedModel::from_artifact(parse(json!({
            "kind": "linear",
            "intercept": 0.0,
            "coefficients": vec![1.0; FEATURE_COUNT - 1]
        })))
        .unwrap();

        let err = model.predict(&DMatrix::zeros(1, FEATURE_COUNT)).unwrap_err();
        assert_eq!(
            err,
            PredictError::ShapeMismatch {
                expected: FEATURE_COUNT - 1,
                got: FEATURE_COUNT
            }
        );
    }

    #[test]
    fn non_finite_output_is_an_error() {
        let model = TrainedModel::from_artifact(parse(json!({
            "kind": "linear",
            "intercept": 0.0,
            "coefficients": vec![1e308; FEATURE_COUNT]
        })))
        .unwrap();

        let batch = DMatrix::from_element(1, FEATURE_COUNT, 10.0);
        let err = model.predict(&batch).unwrap_err();
        assert!(matches!(err, PredictError::NonFinite { row: 0, .. }));
    }

    #[test]
    fn reordered_feature_names_are_rejected() {
        let mut names = canonical_names();
        names.swap(0, 1);
        let err = TrainedModel::from_artifact(parse(json!({
            "kind": "linear",
            "features": names,
            "intercept": 0.0,
            "coefficients": vec![1.0; FEATURE_COUNT]
        })))
        .unwrap_err();
        assert_eq!(
            err,
            ArtifactError::FeatureOrder {
                index: 0,
                expected: "distance_to_solar_noon",
                found: "temperature".to_string(),
            }
        );
    }

    #[test]
    fn tree_models_need_a_declared_width() {
        let err = TrainedModel::from_artifact(parse(json!({
            "kind": "forest",
            "trees": [stump()]
        })))
        .unwrap_err();
        assert_eq!(err, ArtifactError::MissingWidth);
    }

    #[test]
    fn malformed_trees_are_rejected() {
        let backwards = json!({
            "children_left": [-1, 0],
            "children_right": [-1, 0],
            "feature": [-2, 0],
            "threshold": [0.0, 1.0],
            "value": [1.0, 0.0]
        });
        let err = TrainedModel::from_artifact(parse(json!({
            "kind": "forest",
            "n_features": FEATURE_COUNT,
            "trees": [stump(), backwards]
        })))
        .unwrap_err();
        assert!(matches!(err, ArtifactError::Tree { tree: 1, .. }));

        let wide_split = json!({
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [12, -2, -2],
            "threshold": [0.0, 0.0, 0.0],
            "value": [0.0, 1.0, 2.0]
        });
        let err = TrainedModel::from_artifact(parse(json!({
            "kind": "forest",
            "n_features": FEATURE_COUNT,
            "trees": [wide_split]
        })))
        .unwrap_err();
        assert!(err.to_string().contains("feature 12"));
    }

    #[test]
    fn empty_forest_is_rejected() {
        let err = TrainedModel::from_artifact(parse(json!({
            "kind": "forest",
            "n_features": FEATURE_COUNT,
            "trees": []
        })))
        .unwrap_err();
        assert_eq!(err, ArtifactError::Empty("trees"));
    }
}
