//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the twelve model inputs and their UI bounds (`InputField`, `FieldSpec`)
//! - the current form state (`InputValues`)
//! - the fixed-order model input (`FeatureVector`)

pub mod types;

pub use types::*;
