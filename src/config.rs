//! Type-Safe Configuration with Validation
//!
//! Values come from the environment (after loading `.env` when present) and
//! are validated before the service starts.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

use crate::observability::LogFormat;

const MIN_SECRET_BYTES: usize = 32;

/// Ten years
const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    /// Invalid port number
    #[error("Invalid port for {0}: must be between 1 and 65535")]
    InvalidPort(&'static str),

    /// A duration or count that must be positive was zero
    #[error("Invalid {0}: must be greater than 0")]
    NotPositive(&'static str),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Both or neither key sources configured
    #[error("Exactly one of JWT_SECRET or JWKS_URL must be set")]
    AmbiguousKeySource,

    /// Signing secret unusable
    #[error("Invalid JWT_SECRET: {0}")]
    InvalidSecret(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError { name: String, reason: String },
}

/// Where token verification keys come from.
#[derive(Clone)]
pub enum KeySource {
    /// Shared HMAC secret (decoded bytes)
    Secret(Vec<u8>),
    /// Remote JWKS endpoint with asymmetric keys
    Jwks(Url),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret(bytes) => write!(f, "Secret([{} bytes redacted])", bytes.len()),
            Self::Jwks(url) => f.debug_tuple("Jwks").field(&url.as_str()).finish(),
        }
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for both listeners
    pub host: String,
    /// API port (1-65535)
    pub port: u16,
    /// Prometheus scrape port
    pub metrics_port: u16,
    pub key_source: KeySource,
    /// HMAC algorithm for secret-based signing
    pub jwt_algorithm: Algorithm,
    /// Required `iss`, when set
    pub jwt_issuer: Option<String>,
    /// Clock skew tolerance for `exp`/`nbf`
    pub jwt_leeway_seconds: i64,
    /// Lifetime of tokens issued at login
    pub jwt_ttl_seconds: u64,
    pub jwks_refresh_interval_seconds: u64,
    pub bcrypt_cost: u32,
    /// JSON file of accounts for the login endpoint
    pub users_file: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8080)?,
            metrics_port: parse_env("METRICS_PORT", 9090)?,
            key_source: parse_key_source()?,
            jwt_algorithm: parse_env("JWT_ALGORITHM", Algorithm::HS256)?,
            jwt_issuer: parse_optional_env("JWT_ISSUER"),
            jwt_leeway_seconds: parse_env("JWT_LEEWAY_SECONDS", 0)?,
            jwt_ttl_seconds: parse_env("JWT_TTL_SECONDS", 3600)?,
            jwks_refresh_interval_seconds: parse_env("JWKS_REFRESH_INTERVAL", 300)?,
            bcrypt_cost: parse_env("BCRYPT_COST", 10)?,
            users_file: parse_optional_env("USERS_FILE").map(PathBuf::from),
            log_format: parse_env("LOG_FORMAT", LogFormat::Json)?,
            shutdown_timeout_seconds: parse_env("SHUTDOWN_TIMEOUT", 30)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort("PORT"));
        }
        if self.metrics_port == 0 {
            return Err(ConfigError::InvalidPort("METRICS_PORT"));
        }
        if self.jwt_ttl_seconds == 0 {
            return Err(ConfigError::NotPositive("JWT_TTL_SECONDS"));
        }
        if self.jwt_ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::ParseError {
                name: "JWT_TTL_SECONDS".to_string(),
                reason: format!("must not exceed {MAX_TTL_SECONDS} seconds"),
            });
        }
        if self.jwks_refresh_interval_seconds == 0 {
            return Err(ConfigError::NotPositive("JWKS_REFRESH_INTERVAL"));
        }
        if self.jwt_leeway_seconds < 0 {
            return Err(ConfigError::ParseError {
                name: "JWT_LEEWAY_SECONDS".to_string(),
                reason: "leeway must not be negative".to_string(),
            });
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::ParseError {
                name: "BCRYPT_COST".to_string(),
                reason: "cost must be between 4 and 31".to_string(),
            });
        }
        if matches!(self.jwt_issuer.as_deref(), Some("")) {
            return Err(ConfigError::MissingRequired("JWT_ISSUER".to_string()));
        }
        if let KeySource::Secret(secret) = &self.key_source {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(ConfigError::InvalidSecret(format!(
                    "decoded secret must be at least {MIN_SECRET_BYTES} bytes"
                )));
            }
            if !matches!(
                self.jwt_algorithm,
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
            ) {
                return Err(ConfigError::ParseError {
                    name: "JWT_ALGORITHM".to_string(),
                    reason: "a shared secret requires HS256, HS384 or HS512".to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn jwks_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.jwks_refresh_interval_seconds)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        let secs = self.jwt_ttl_seconds.min(MAX_TTL_SECONDS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
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

/// Unset and blank both count as absent.
fn parse_optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a URL environment variable.
fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

fn parse_key_source() -> Result<KeySource, ConfigError> {
    key_source_from(
        parse_optional_env("JWT_SECRET").as_deref(),
        parse_optional_env("JWKS_URL").as_deref(),
    )
}

fn key_source_from(secret: Option<&str>, jwks_url: Option<&str>) -> Result<KeySource, ConfigError> {
    match (secret, jwks_url) {
        (Some(secret), None) => BASE64
            .decode(secret)
            .map(KeySource::Secret)
            .map_err(|e| ConfigError::InvalidSecret(format!("not valid base64: {e}"))),
        (None, Some(url)) => parse_url("JWKS_URL", url).map(KeySource::Jwks),
        _ => Err(ConfigError::AmbiguousKeySource),
    }
}
