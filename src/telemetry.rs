//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the filter comes from `app.log_level`,
//! which accepts Python-style names (`WARNING`, `CRITICAL`) as well as the
//! usual tracing levels.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, Settings};

/// Map a configured log level onto a tracing level name.
pub fn tracing_level(log_level: &str) -> &'static str {
    match log_level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn filter_directive(log_level: &str) -> String {
    let level = tracing_level(log_level);
    format!("{level},tower_http={level}")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&settings.app.log_level)));

    match settings.app.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
