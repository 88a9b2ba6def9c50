//! Runtime settings read from the environment (and `.env`, if present).
//!
//! - `SOLAR_LOG`: tracing filter directive (default `info`)
//! - `SOLAR_LOG_FILE`: log destination (default `solar.log`)
//!
//! The model path is not configurable; see [`crate::models::MODEL_PATH`].

use std::path::PathBuf;

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "solar.log";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_filter: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            log_filter: non_empty("SOLAR_LOG").unwrap_or(defaults.log_filter),
            log_file: non_empty("SOLAR_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }
}
