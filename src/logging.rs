//! Tracing subscriber setup for the binaries. The library only emits events.

use crate::error::ChainError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a stderr `fmt` subscriber. `RUST_LOG` overrides `default_level`.
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging(default_level: &str) -> Result<(), ChainError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| ChainError::LoggingError(e.to_string()))
}
