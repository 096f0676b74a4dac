//! Tracing subscriber setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{LogConfig, RecorderError, RecorderResult};

/// Build the filter: `RUST_LOG` wins, then the configured level
pub fn env_filter(config: &LogConfig) -> RecorderResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| RecorderError::Config(format!("log level {:?}: {e}", config.level))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LogConfig) -> RecorderResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(config.include_targets))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(config.include_targets))
            .try_init()
    };
    result.map_err(|e| RecorderError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_rejected() {
        let config = LogConfig {
            level: "syncline=loud".to_string(),
            ..Default::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(env_filter(&config), Err(RecorderError::Config(_))));
        }
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(RecorderError::Telemetry(_))));
    }
}
