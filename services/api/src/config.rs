//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: String,
    pub vision_model: String,
    pub analysis_max_retries: u32,
    pub analysis_retry_delay: Duration,
    pub analysis_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://medscan.db?mode=rwc".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Key (required; without it no analysis can run) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        // --- Load Adapter-specific Settings ---
        let vision_model =
            std::env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let analysis_max_retries = parse_var_or("ANALYSIS_MAX_RETRIES", 3)?;
        let analysis_retry_delay =
            Duration::from_secs(parse_var_or("ANALYSIS_RETRY_DELAY_SECS", 5)?);
        let analysis_timeout = Duration::from_secs(parse_var_or("ANALYSIS_TIMEOUT_SECS", 120)?);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            vision_model,
            analysis_max_retries,
            analysis_retry_delay,
            analysis_timeout,
        })
    }
}

fn parse_var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One sequential test: the process environment is shared, so the
    // missing-key and happy-path cases must not run in parallel.
    #[test]
    fn api_key_is_required_and_defaults_apply_when_present() {
        for var in [
            "OPENAI_API_KEY",
            "VISION_MODEL",
            "ANALYSIS_MAX_RETRIES",
            "ANALYSIS_RETRY_DELAY_SECS",
        ] {
            std::env::remove_var(var);
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "OPENAI_API_KEY"));

        std::env::set_var("OPENAI_API_KEY", "test-key");
        let config = Config::from_env().unwrap();
        assert_eq!(config.openai_api_key, "test-key");
        assert_eq!(config.vision_model, "gpt-4o");
        assert_eq!(config.analysis_max_retries, 3);
        assert_eq!(config.analysis_retry_delay, Duration::from_secs(5));
        std::env::remove_var("OPENAI_API_KEY");
    }
}
