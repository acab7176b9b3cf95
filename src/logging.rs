//! Logging initialization
//!
//! Pretty output for local development, JSON for hosted environments.
//! Level selection honors `RUST_LOG` first, then the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber
///
/// # Arguments
/// * `config` - Logging configuration (level + format)
///
/// Safe to call once per process; subsequent calls are ignored so tests
/// can initialize logging independently.
pub fn init(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("teekdocs={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber was already initialized");
    }
}
