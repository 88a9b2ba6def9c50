//! User-facing text: prediction messages and input tables.

pub mod format;

pub use format::*;
