//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl LoggingConfig {
    /// `debug` when verbose, `info` otherwise.
    pub fn new(verbose: bool, json_logs: bool) -> Self {
        let level = if verbose { "debug" } else { "info" };
        Self {
            default_filter: level.to_string(),
            json_logs,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured default filter.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_picks_default_filter() {
        assert_eq!(LoggingConfig::new(false, false).default_filter, "info");
        assert_eq!(LoggingConfig::new(true, true).default_filter, "debug");
    }
}
