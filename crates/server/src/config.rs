//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MAANI_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `MAANI_HOST` - Bind address (default: 127.0.0.1)
//! - `MAANI_PORT` - Listen port (default: 3000)
//! - `MAANI_GEOCODING_URL` - Nominatim-compatible base URL
//! - `MAANI_WEATHER_URL` - Open-Meteo-compatible base URL
//! - `MAANI_HTTP_TIMEOUT_SECS` - Timeout for outbound HTTP calls (default: 5)
//! - `MAANI_DEFAULT_RADIUS_KM` - Nearby search radius when none is given (default: 10)
//! - `MAANI_LOG_JSON` - Emit JSON logs when set to anything but `0`/`false`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct MaaniConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Outbound location API configuration
    pub location: LocationConfig,
    /// Radius used by the nearby search when the caller omits one
    pub default_radius_km: f64,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
}

/// Reverse-geocoding and weather endpoints.
#[derive(Debug, Clone)]
pub struct LocationConfig {
    pub geocoding_url: Url,
    pub weather_url: Url,
    pub timeout: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geocoding_url: Url::parse(DEFAULT_GEOCODING_URL)
                .expect("default geocoding URL is valid"),
            weather_url: Url::parse(DEFAULT_WEATHER_URL).expect("default weather URL is valid"),
            timeout: Duration::from_secs(5),
        }
    }
}

impl MaaniConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MAANI_DATABASE_URL")?;
        let host = parse_env("MAANI_HOST", "127.0.0.1")?;
        let port = parse_env("MAANI_PORT", "3000")?;
        let default_radius_km = parse_env::<f64>("MAANI_DEFAULT_RADIUS_KM", "10")?;
        if !default_radius_km.is_finite() || default_radius_km <= 0.0 {
            return Err(ConfigError::InvalidEnvVar(
                "MAANI_DEFAULT_RADIUS_KM".to_string(),
                "must be a positive number".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            location: LocationConfig::from_env()?,
            default_radius_km,
            log_json: get_optional_env("MAANI_LOG_JSON").is_some_and(|v| is_truthy(&v)),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            geocoding_url: parse_url("MAANI_GEOCODING_URL", DEFAULT_GEOCODING_URL)?,
            weather_url: parse_url("MAANI_WEATHER_URL", DEFAULT_WEATHER_URL)?,
            timeout: Duration::from_secs(parse_env("MAANI_HTTP_TIMEOUT_SECS", "5")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL; only `http` and `https` are accepted.
fn parse_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let url: Url = parse_env(key, default)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(" False "));
        assert!(!is_truthy("off"));
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let port: u16 = parse_env("MAANI_TEST_UNSET_PORT_VAR", "3000").unwrap();
        assert_eq!(port, 3000);

        let err = parse_env::<u16>("MAANI_TEST_UNSET_PORT_VAR", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "MAANI_TEST_UNSET_PORT_VAR"));
    }

    #[test]
    fn test_parse_url_rejects_non_http_schemes() {
        let url = parse_url("MAANI_TEST_UNSET_URL_VAR", "https://example.org").unwrap();
        assert_eq!(url.host_str(), Some("example.org"));

        let err = parse_url("MAANI_TEST_UNSET_URL_VAR", "ftp://example.org").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_location_defaults() {
        let location = LocationConfig::default();
        assert_eq!(location.geocoding_url.as_str(), "https://nominatim.openstreetmap.org/");
        assert_eq!(location.weather_url.as_str(), "https://api.open-meteo.com/");
        assert_eq!(location.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_socket_addr() {
        let config = MaaniConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            location: LocationConfig::default(),
            default_radius_km: 10.0,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let config = MaaniConfig {
            database_url: SecretString::from("postgres://maani:hunter2@db/maani"),
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            location: LocationConfig::default(),
            default_radius_km: 10.0,
            log_json: true,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
