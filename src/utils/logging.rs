//! Structured logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the application. [`init_logging`] is a convenience that builds one from a
//! [`LoggingConfig`], letting `RUST_LOG` override the configured level.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::init_metrics;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init_logging`]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()))
}

/// Install a global subscriber and start the metrics collector.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = if config.json_format {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
    };

    installed.map_err(|e| ProtocolError::ConfigError(format!("Failed to install logger: {e}")))?;

    tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    init_metrics();
    Ok(())
}
