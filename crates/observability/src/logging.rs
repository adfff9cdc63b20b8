//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set (e.g. `info`,
    /// `storefront_products=debug`).
    pub level: String,
    /// JSON lines when true, human-readable text otherwise.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl LogConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over `config.level`. Safe to call multiple times
/// (subsequent calls are no-ops); returns whether this call installed the
/// subscriber.
pub fn init(config: &LogConfig) -> bool {
    let filter = config.filter();

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info_json() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.json);
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = LogConfig {
            level: "debug".to_string(),
            json: false,
        };
        init(&config);
        assert!(!init(&config));
    }
}
