//! Logging initialization helper

use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Install a global tracing subscriber. `RUST_LOG` overrides the configured
/// level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> SessionResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|err| SessionError::Logging {
            message: err.to_string(),
        })
}
