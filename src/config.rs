//! Client configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use secrecy::SecretString;

/// Default values used when a variable is unset.
pub mod defaults {
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Credentials shared with every attachment download.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Attachment client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Basic-auth credentials for the test-management service
    pub credentials: Credentials,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
    /// HTTP total request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration with default timeouts.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TRS_USER`: Service user - REQUIRED
    /// - `TRS_PASSWORD`: Service password - REQUIRED
    /// - `TRS_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 5)
    /// - `TRS_REQUEST_TIMEOUT_SECS`: Request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user = lookup("TRS_USER").ok_or(ConfigError::MissingEnvVar("TRS_USER"))?;
        if user.trim().is_empty() {
            return Err(ConfigError::InvalidValue("TRS_USER must not be empty"));
        }
        let password = lookup("TRS_PASSWORD").ok_or(ConfigError::MissingEnvVar("TRS_PASSWORD"))?;

        let connect_timeout = lookup("TRS_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::CONNECT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TRS_CONNECT_TIMEOUT_SECS must be a valid number")
            })?;

        let request_timeout = lookup("TRS_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TRS_REQUEST_TIMEOUT_SECS must be a valid number")
            })?;

        Ok(ClientConfig {
            credentials: Credentials::new(user, password),
            connect_timeout: Duration::from_secs(connect_timeout),
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),
}
