//! Tracing setup.
//!
//! The TUI owns stdout/stderr while it runs, so events are written to a log
//! file instead of the terminal.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::AppError;

/// Install the global subscriber. Callers treat failure as a warning.
pub fn init(config: &AppConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(&config.log_filter).map_err(|e| {
        AppError::new(
            2,
            format!("Invalid SOLAR_LOG filter '{}': {e}", config.log_filter),
        )
    })?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| {
            AppError::new(
                4,
                format!("Failed to open log file '{}': {e}", config.log_file.display()),
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| AppError::new(4, format!("Failed to initialize logging: {e}")))
}
