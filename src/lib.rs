//! `solar-predict` library crate.
//!
//! The binary (`solar`) is a thin wrapper around this library so that:
//!
//! - the prediction pipeline is testable without a terminal
//! - the CLI and the TUI share one code path from form values to model output

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod tui;
