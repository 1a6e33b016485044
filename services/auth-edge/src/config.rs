//! Type-Safe Configuration with Validation
//!
//! Loaded from environment variables (`.env` honoured) and validated before
//! the server binds.

use rust_common::CircuitBreakerConfig;
use session_service::validation::MAX_TTL_SECS;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound for outbound timeouts.
const MAX_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Seven days.
const DEFAULT_AUTH_DURATION_SECS: i64 = 604_800;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable name
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid TTL value
    #[error("Invalid auth duration: must be between 1 and {MAX_TTL_SECS} seconds")]
    InvalidTtl,

    /// Invalid threshold value
    #[error("Invalid threshold: must be greater than 0")]
    InvalidThreshold,

    /// Timeout outside the accepted range
    #[error("Invalid timeout for {name}: must be greater than 0 and less than 10s")]
    InvalidTimeout {
        /// Variable name
        name: String,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Session service URL
    pub session_service_url: Url,
    /// Paths that skip authentication
    pub api_whitelist: Vec<String>,
    /// TTL each successful check slides the token to (must be > 0)
    pub auth_duration_seconds: i64,
    /// Dial timeout towards the session service
    pub session_connect_timeout: Duration,
    /// Per-call timeout towards the session service
    pub session_request_timeout: Duration,
    /// Circuit breaker failure threshold (must be > 0)
    pub circuit_breaker_failure_threshold: u32,
    /// Circuit breaker timeout in seconds
    pub circuit_breaker_timeout_seconds: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Any unparsable or out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 50052)?,
            session_service_url: parse_url_env("SESSION_SERVICE_URL", "http://localhost:50053")?,
            api_whitelist: parse_list_env("API_WHITELIST"),
            auth_duration_seconds: parse_env("AUTH_DURATION_SECONDS", DEFAULT_AUTH_DURATION_SECS)?,
            session_connect_timeout: Duration::from_millis(parse_env(
                "SESSION_CONNECT_TIMEOUT_MS",
                2000,
            )?),
            session_request_timeout: Duration::from_millis(parse_env(
                "SESSION_REQUEST_TIMEOUT_MS",
                3000,
            )?),
            circuit_breaker_failure_threshold: parse_env("CB_FAILURE_THRESHOLD", 5)?,
            circuit_breaker_timeout_seconds: parse_env("CB_TIMEOUT", 30)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
            log_json: parse_env("LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// The first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !(1..=MAX_TTL_SECS).contains(&self.auth_duration_seconds) {
            return Err(ConfigError::InvalidTtl);
        }
        if self.circuit_breaker_failure_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        check_timeout("SESSION_CONNECT_TIMEOUT_MS", self.session_connect_timeout)?;
        check_timeout("SESSION_REQUEST_TIMEOUT_MS", self.session_request_timeout)?;
        if !matches!(self.session_service_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                field: "SESSION_SERVICE_URL".to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// `ParseError` if `host:port` does not parse.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::ParseError {
                name: "HOST".to_string(),
                reason: e.to_string(),
            })
    }

    /// Breaker settings for the session service.
    #[must_use]
    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::default()
            .with_failure_threshold(self.circuit_breaker_failure_threshold)
            .with_timeout(Duration::from_secs(self.circuit_breaker_timeout_seconds))
    }

    /// Graceful shutdown window.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

fn check_timeout(name: &str, timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() || timeout >= MAX_OUTBOUND_TIMEOUT {
        return Err(ConfigError::InvalidTimeout {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a comma-separated list environment variable.
fn parse_list_env(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config_base() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 50052,
            session_service_url: Url::parse("http://localhost:50053").unwrap(),
            api_whitelist: vec!["/healthz".to_string()],
            auth_duration_seconds: DEFAULT_AUTH_DURATION_SECS,
            session_connect_timeout: Duration::from_millis(2000),
            session_request_timeout: Duration::from_millis(3000),
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_timeout_seconds: 30,
            shutdown_timeout_seconds: 30,
            log_json: false,
        }
    }

    #[test]
    fn test_base_config_is_valid() {
        assert!(test_config_base().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let mut config = test_config_base();
        config.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_config_validation_non_positive_duration() {
        let mut config = test_config_base();
        config.auth_duration_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTtl));
    }

    #[test]
    fn test_config_validation_duration_above_session_limit() {
        let mut config = test_config_base();
        config.auth_duration_seconds = MAX_TTL_SECS + 1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTtl));

        config.auth_duration_seconds = MAX_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_threshold() {
        let mut config = test_config_base();
        config.circuit_breaker_failure_threshold = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn test_config_validation_slow_timeouts() {
        let mut config = test_config_base();
        config.session_request_timeout = Duration::from_secs(30);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_config_validation_bad_scheme() {
        let mut config = test_config_base();
        config.session_service_url = Url::parse("redis://localhost:6379").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_parse_url_env_invalid() {
        let result = parse_url_env("NONEXISTENT_SESSION_URL_VAR", "not-a-valid-url");
        assert!(result.is_err());
    }

    #[test]
    fn test_breaker_config_follows_settings() {
        let cb = test_config_base().circuit_breaker_config();
        assert_eq!(cb.failure_threshold, 5);
        assert_eq!(cb.timeout, Duration::from_secs(30));
    }
}
