//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Reads `[logging] level` and `[logging] json`.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            level: config
                .get_string("logging", "level")
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or(defaults.level),
            json: config.get_bool("logging", "json", defaults.json),
        }
    }

    /// `RUST_LOG` wins over the configured level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Install the global subscriber, writing to stderr. A second call is a no-op.
pub fn init_tracing(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
