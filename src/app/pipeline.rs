//! Shared prediction pipeline used by both the CLI and TUI front-ends.
//!
//! form values -> fixed-order feature vector -> single-row batch -> predictor
//!
//! Every call is a pure function of the inputs and the (read-only) predictor.
//! Nothing is cached between calls.

use tracing::{debug, info, warn};

use crate::domain::{FeatureVector, InputField, InputValues, to_batch};
use crate::models::{PredictError, Predictor};

/// Predicted output in kW, or why the model could not produce one.
pub type PredictionResult = Result<f64, PredictError>;

/// Assemble the model input row in training column order.
pub fn assemble_features(inputs: &InputValues) -> FeatureVector {
    FeatureVector::new(InputField::ALL.map(|field| inputs.get(field)))
}

/// Run one prediction for the current form values.
pub fn predict(predictor: &dyn Predictor, inputs: &InputValues) -> PredictionResult {
    let features = assemble_features(inputs);
    debug!(features = ?features.as_slice(), "assembled feature vector");

    let result = predictor
        .predict(&features.to_batch())
        .and_then(|out| out.iter().next().copied().ok_or(PredictError::EmptyOutput));

    match &result {
        Ok(kw) => info!(kw, "prediction succeeded"),
        Err(err) => warn!(error = %err, retryable = err.is_retryable(), "prediction failed"),
    }
    result
}

/// One point of a sensitivity sweep: (input value, predicted kW).
pub type SweepPoint = (f64, f64);

/// Vary `field` across its range with all other inputs held fixed.
///
/// All rows go to the predictor in a single batch call.
pub fn sweep(
    predictor: &dyn Predictor,
    inputs: &InputValues,
    field: InputField,
    points: usize,
) -> Result<Vec<SweepPoint>, PredictError> {
    let spec = field.spec();
    let n = points.max(2);

    let xs: Vec<f64> = (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            spec.min + u * (spec.max - spec.min)
        })
        .collect();

    let base = assemble_features(inputs);
    let rows: Vec<FeatureVector> = xs
        .iter()
        .map(|&x| {
            let mut values = [0.0; crate::domain::FEATURE_COUNT];
            values.copy_from_slice(base.as_slice());
            values[field.index()] = x;
            FeatureVector::new(values)
        })
        .collect();

    let out = predictor.predict(&to_batch(&rows))?;
    if out.len() != n {
        return Err(PredictError::Internal(format!(
            "model returned {} outputs for {n} rows",
            out.len()
        )));
    }

    debug!(field = field.key(), points = n, "sensitivity sweep complete");
    Ok(xs.into_iter().zip(out.iter().copied()).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use nalgebra::{DMatrix, DVector};

    use crate::domain::FEATURE_COUNT;
    use crate::report::format_result;

    /// Returns a fixed value when given exactly the expected row.
    pub(crate) struct FixedPredictor {
        pub expected: Vec<f64>,
        pub value: f64,
        pub calls: AtomicUsize,
    }

    impl FixedPredictor {
        pub(crate) fn at_defaults(value: f64) -> Self {
            Self {
                expected: assemble_features(&InputValues::default()).as_slice().to_vec(),
                value,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Predictor for FixedPredictor {
        fn describe(&self) -> String {
            "fixed stub".to_string()
        }

        fn predict(&self, batch: &DMatrix<f64>) -> Result<DVector<f64>, PredictError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let row: Vec<f64> = batch.row(0).iter().copied().collect();
            if row != self.expected {
                return Err(PredictError::Internal("unexpected input row".to_string()));
            }
            Ok(DVector::from_element(batch.nrows(), self.value))
        }
    }

    /// Always fails like a model trained on a different column count.
    pub(crate) struct MisshapenPredictor;

    impl Predictor for MisshapenPredictor {
        fn describe(&self) -> String {
            "misshapen stub".to_string()
        }

        fn predict(&self, batch: &DMatrix<f64>) -> Result<DVector<f64>, PredictError> {
            Err(PredictError::ShapeMismatch {
                expected: 11,
                got: batch.ncols(),
            })
        }
    }

    /// Sums each row; records every batch it sees.
    struct SumPredictor {
        seen: Mutex<Vec<DMatrix<f64>>>,
    }

    impl Predictor for SumPredictor {
        fn describe(&self) -> String {
            "sum stub".to_string()
        }

        fn predict(&self, batch: &DMatrix<f64>) -> Result<DVector<f64>, PredictError> {
            self.seen.lock().unwrap().push(batch.clone());
            Ok(DVector::from_fn(batch.nrows(), |r, _| batch.row(r).sum()))
        }
    }

    #[test]
    fn assembly_preserves_declared_order() {
        let mut inputs = InputValues::default();
        // Give every field a distinct in-range value derived from its position.
        for (i, field) in InputField::ALL.iter().enumerate() {
            let spec = field.spec();
            let value = spec.snap(spec.min + (spec.max - spec.min) * (i as f64 + 1.0) / 13.0);
            inputs.set(*field, value).unwrap();
        }

        let features = assemble_features(&inputs);
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
        for (i, field) in InputField::ALL.iter().enumerate() {
            assert_eq!(features.as_slice()[i], inputs.get(*field), "column {i}");
        }
        assert_eq!(features.get(InputField::Humidity), inputs.get(InputField::Humidity));
    }

    #[test]
    fn default_inputs_map_to_documented_vector() {
        let features = assemble_features(&InputValues::default());
        assert_eq!(
            features.as_slice(),
            &[1.5, 25.0, 0.9, 0.2, 3.0, 90.0, 1.0, -0.5, 2.8, 1012.0, 40.0, 10.0]
        );
    }

    #[test]
    fn stub_value_is_formatted_to_two_decimals() {
        let predictor = FixedPredictor::at_defaults(3.14159);
        let result = predict(&predictor, &InputValues::default());
        assert_eq!(result, Ok(3.14159));
        assert_eq!(format_result(&result), "Predicted Solar Power Output: 3.14 kW");
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn predictor_failure_is_surfaced_not_raised() {
        let inputs = InputValues::default();
        let result = predict(&MisshapenPredictor, &inputs);
        let message = format_result(&result);
        assert!(message.starts_with("An error occurred during prediction:"), "{message}");
        assert!(message.contains("expecting 11 features"));

        // The caller can adjust and try again.
        let retry = predict(&FixedPredictor::at_defaults(1.0), &inputs);
        assert_eq!(retry, Ok(1.0));
    }

    #[test]
    fn empty_model_output_is_an_error() {
        struct Empty;
        impl Predictor for Empty {
            fn describe(&self) -> String {
                "empty".to_string()
            }
            fn predict(&self, _: &DMatrix<f64>) -> Result<DVector<f64>, PredictError> {
                Ok(DVector::zeros(0))
            }
        }
        assert_eq!(predict(&Empty, &InputValues::default()), Err(PredictError::EmptyOutput));
    }

    #[test]
    fn bounds_produce_well_formed_vectors() {
        let predictor = SumPredictor {
            seen: Mutex::new(Vec::new()),
        };
        let cases: [(InputValues, fn(InputField) -> f64); 2] = [
            (InputValues::minimums(), |f| f.spec().min),
            (InputValues::maximums(), |f| f.spec().max),
        ];
        for (inputs, pick) in cases {
            let features = assemble_features(&inputs);
            for field in InputField::ALL {
                let v = features.get(field);
                assert!(v.is_finite());
                assert_eq!(v, pick(field));
            }
            assert!(predict(&predictor, &inputs).is_ok());
        }

        let seen = predictor.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for batch in seen.iter() {
            assert_eq!(batch.shape(), (1, FEATURE_COUNT));
        }
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let predictor = FixedPredictor::at_defaults(812.456);
        let inputs = InputValues::default();
        let first = format_result(&predict(&predictor, &inputs));
        let second = format_result(&predict(&predictor, &inputs));
        assert_eq!(first, second);
        assert_eq!(first, "Predicted Solar Power Output: 812.46 kW");
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sweep_varies_only_the_selected_field_in_one_call() {
        let predictor = SumPredictor {
            seen: Mutex::new(Vec::new()),
        };
        let inputs = InputValues::default();
        let points = sweep(&predictor, &inputs, InputField::Humidity, 5).unwrap();

        assert_eq!(points.len(), 5);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[4].0, 100.0);

        let base: f64 = assemble_features(&inputs).as_slice().iter().sum();
        for &(x, y) in &points {
            let expected = base - inputs.get(InputField::Humidity) + x;
            assert!((y - expected).abs() < 1e-9);
        }

        let seen = predictor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].nrows(), 5);
        assert_eq!(seen[0][(2, InputField::Temperature.index())], 25.0);
    }

    #[test]
    fn sweep_propagates_predictor_errors() {
        let err = sweep(&MisshapenPredictor, &InputValues::default(), InputField::WindU, 10)
            .unwrap_err();
        assert!(matches!(err, PredictError::ShapeMismatch { .. }));
    }
}
