//! Pre-trained power-output models.
//!
//! - the inference seam used by the pipeline (`predictor`)
//! - the portable JSON artifact and its evaluation (`model`)
//! - the startup gate that reads the artifact from disk (`loader`)

pub mod loader;
pub mod model;
pub mod predictor;

pub use loader::*;
pub use model::*;
pub use predictor::*;
