//! Formatted output shared by the CLI and the TUI.
//!
//! Keeping the message text here means both front-ends show exactly the same
//! strings for the same outcome.

use crate::app::pipeline::PredictionResult;
use crate::domain::{FeatureVector, InputField, InputValues};
use crate::models::PredictError;

/// Success message for a prediction in kW.
pub fn format_prediction(kw: f64) -> String {
    format!("Predicted Solar Power Output: {kw:.2} kW")
}

/// Failure message carrying the underlying cause.
pub fn format_prediction_error(err: &PredictError) -> String {
    format!("An error occurred during prediction: {err}")
}

pub fn format_result(result: &PredictionResult) -> String {
    match result {
        Ok(kw) => format_prediction(*kw),
        Err(err) => format_prediction_error(err),
    }
}

/// Table of every input: key, label, bounds, default, and current value.
pub fn format_input_table(values: &InputValues) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<26} {:<34} {:>8} {:>8} {:>8} {:>8}",
            "input", "label", "min", "max", "default", "value"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<26} {:-<34} {:-<8} {:-<8} {:-<8} {:-<8}",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for field in InputField::ALL {
        let spec = field.spec();
        out.push_str(
            format!(
                "{:<26} {:<34} {:>8} {:>8} {:>8} {:>8}",
                spec.key,
                truncate(&spec.display_label(), 34),
                spec.format_value(spec.min),
                spec.format_value(spec.max),
                spec.format_value(spec.default),
                spec.format_value(values.get(field)),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// One `key = value` line per column, in model order.
pub fn format_feature_vector(features: &FeatureVector) -> String {
    let mut out = String::new();
    for (i, field) in InputField::ALL.iter().enumerate() {
        out.push_str(&format!(
            "{i:>2} {:<26} {}\n",
            field.key(),
            features.get(*field)
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
