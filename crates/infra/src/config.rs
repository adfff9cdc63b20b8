//! Configuration loading and representation.

use std::env::VarError;

use storefront_observability::LogConfig;
use storefront_products::PLACEHOLDER_IMAGE;
use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Runtime settings of the storefront services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Image shown when neither an option nor the product has one.
    pub placeholder_image: String,
    /// Quantity ceiling for variants whose stock is not tracked.
    pub max_untracked_quantity: u32,
    pub log: LogConfig,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            max_untracked_quantity: 999,
            log: LogConfig::default(),
        }
    }
}

impl StorefrontConfig {
    /// Install the process-wide subscriber with the configured level and
    /// output format. Returns `false` when one was already installed.
    pub fn init_logging(&self) -> bool {
        storefront_observability::init(&self.log)
    }
}

/// Load configuration from the process environment and start logging with it.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unparseable value.
pub fn bootstrap() -> Result<StorefrontConfig, ConfigError> {
    let config = load_config()?;
    config.init_logging();
    tracing::info!(
        placeholder_image = %config.placeholder_image,
        max_untracked_quantity = config.max_untracked_quantity,
        "storefront configuration loaded"
    );
    Ok(config)
}

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unparseable value.
pub fn load_config() -> Result<StorefrontConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build configuration from an env-var lookup function. Every variable is
/// optional.
pub fn build_config<F>(lookup: F) -> Result<StorefrontConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let defaults = StorefrontConfig::default();

    let non_blank = |var: &str| -> Option<String> {
        lookup(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let max_untracked_quantity = match non_blank("STOREFRONT_MAX_UNTRACKED_QUANTITY") {
        Some(raw) => {
            let n = raw
                .parse::<u32>()
                .map_err(|e| invalid("STOREFRONT_MAX_UNTRACKED_QUANTITY", e.to_string()))?;
            if n == 0 {
                return Err(invalid(
                    "STOREFRONT_MAX_UNTRACKED_QUANTITY",
                    "must be at least 1".to_string(),
                ));
            }
            n
        }
        None => defaults.max_untracked_quantity,
    };

    let json = match non_blank("STOREFRONT_LOG_JSON") {
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            invalid("STOREFRONT_LOG_JSON", format!("expected a boolean, got {raw:?}"))
        })?,
        None => defaults.log.json,
    };

    Ok(StorefrontConfig {
        placeholder_image: non_blank("STOREFRONT_PLACEHOLDER_IMAGE")
            .unwrap_or(defaults.placeholder_image),
        max_untracked_quantity,
        log: LogConfig {
            level: non_blank("STOREFRONT_LOG_LEVEL").unwrap_or(defaults.log.level),
            json,
        },
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
