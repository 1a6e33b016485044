//! Configuration for the session service.
//!
//! All configuration is loaded from environment variables (a `.env` file is
//! honoured) and validated at startup.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound for any store timeout.
const MAX_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Timeout outside the accepted range
    #[error("Invalid timeout for {name}: must be greater than 0 and less than 10s")]
    InvalidTimeout {
        /// Variable name
        name: String,
    },

    /// Unknown storage backend
    #[error("Unknown session backend '{0}': expected 'redis' or 'memory'")]
    UnknownBackend(String),

    /// Address or URL could not be built
    #[error("Invalid address for {field}: {reason}")]
    InvalidAddress {
        /// Offending field
        field: String,
        /// Parser message
        reason: String,
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

/// Where session entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Shared Redis store
    Redis,
    /// In-process map, single replica only
    Memory,
}

impl BackendKind {
    /// Parse a backend name.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` for anything but `redis` or `memory`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Redis connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// ACL username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Logical database index
    pub database: u32,
    /// Connect + initial ping deadline
    pub dial_timeout: Duration,
    /// Per-command deadline
    pub command_timeout: Duration,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("dial_timeout", &self.dial_timeout)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            dial_timeout: Duration::from_millis(5000),
            command_timeout: Duration::from_millis(3000),
        }
    }
}

impl RedisConfig {
    /// Build the `redis://` URL, credentials included.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` if the host or credentials do not form a valid URL.
    pub fn connection_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAddress {
            field: "REDIS_HOST".to_string(),
            reason,
        };

        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.host, self.port, self.database
        ))
        .map_err(|e| invalid(e.to_string()))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|()| invalid("username not accepted".to_string()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|()| invalid("password not accepted".to_string()))?;
        }
        Ok(url)
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Storage backend
    pub backend: BackendKind,
    /// Redis settings, used when `backend` is `Redis`
    pub redis: RedisConfig,
    /// Identifiers that bypass token checks
    pub api_whitelist: Vec<String>,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50053,
            backend: BackendKind::Redis,
            redis: RedisConfig::default(),
            api_whitelist: Vec::new(),
            shutdown_timeout_seconds: 30,
            log_json: false,
        }
    }
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
            port: parse_env("PORT", 50053)?,
            backend: BackendKind::parse(
                &env::var("SESSION_BACKEND").unwrap_or_else(|_| "redis".to_string()),
            )?,
            redis: RedisConfig {
                host: env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env("REDIS_PORT", 6379)?,
                username: non_empty_env("REDIS_USERNAME"),
                password: non_empty_env("REDIS_PASSWORD"),
                database: parse_env("REDIS_DATABASE", 0)?,
                dial_timeout: Duration::from_millis(parse_env("REDIS_DIAL_TIMEOUT_MS", 5000)?),
                command_timeout: Duration::from_millis(parse_env(
                    "REDIS_COMMAND_TIMEOUT_MS",
                    3000,
                )?),
            },
            api_whitelist: parse_list_env("API_WHITELIST"),
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
        if self.port == 0 || self.redis.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        check_timeout("REDIS_DIAL_TIMEOUT_MS", self.redis.dial_timeout)?;
        check_timeout("REDIS_COMMAND_TIMEOUT_MS", self.redis.command_timeout)?;
        if self.backend == BackendKind::Redis {
            self.redis.connection_url()?;
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` if `host:port` does not parse.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
                field: "HOST".to_string(),
                reason: e.to_string(),
            })
    }

    /// Graceful shutdown window.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

fn check_timeout(name: &str, timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() || timeout >= MAX_STORE_TIMEOUT {
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

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
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

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr().unwrap().port(), 50053);
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let config = Config {
            port: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_timeouts_must_be_under_ten_seconds() {
        let mut config = Config::default();
        config.redis.command_timeout = Duration::from_secs(10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout { name }) if name == "REDIS_COMMAND_TIMEOUT_MS"
        ));

        config.redis.command_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(BackendKind::parse("Redis").unwrap(), BackendKind::Redis);
        assert_eq!(BackendKind::parse(" memory ").unwrap(), BackendKind::Memory);
        assert!(matches!(
            BackendKind::parse("etcd"),
            Err(ConfigError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_connection_url_carries_credentials_and_database() {
        let redis = RedisConfig {
            username: Some("svc".to_string()),
            password: Some("p@ss".to_string()),
            database: 3,
            ..RedisConfig::default()
        };
        let url = redis.connection_url().unwrap();

        assert_eq!(url.scheme(), "redis");
        assert_eq!(url.username(), "svc");
        assert_eq!(url.password(), Some("p%40ss"));
        assert_eq!(url.path(), "/3");
    }

    #[test]
    fn test_debug_redacts_password() {
        let redis = RedisConfig {
            password: Some("hunter2".to_string()),
            ..RedisConfig::default()
        };
        let rendered = format!("{redis:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_bad_host_rejected() {
        let config = Config {
            host: "not a host".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }
}
