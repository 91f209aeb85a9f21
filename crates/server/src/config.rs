//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REPARTO_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)
//! - `REPARTO_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `REPARTO_HOST` - Bind address (default: 127.0.0.1)
//! - `REPARTO_PORT` - Listen port (default: 8080)
//! - `REPARTO_REDIS_URL` - Redis connection string (default: redis://127.0.0.1:6379)
//! - `REPARTO_DEPOT_LAT` / `REPARTO_DEPOT_LNG` - Dispatch depot coordinates
//! - `REPARTO_GEOCODER_URL` - Nominatim-compatible base URL
//!   (default: <https://nominatim.openstreetmap.org>)
//! - `REPARTO_GEOCODER_SUFFIX` - Locality appended to every geocoding query
//! - `REPARTO_GEOCODER_USER_AGENT` - User-Agent sent to the geocoder

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use reparto_core::{Coordinates, CoordinatesError};

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Dispatch depot every delivery departs from, unless overridden.
const DEFAULT_DEPOT_LAT: f64 = -31.2503;
const DEFAULT_DEPOT_LNG: f64 = -61.4867;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Redis connection URL for the driver position cache
    pub redis_url: String,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Fixed origin coordinates for every delivery
    pub depot: Coordinates,
    /// Geocoding API configuration
    pub geocoding: GeocodingConfig,
}

/// Geocoding API configuration.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible API
    pub base_url: String,
    /// Locality appended to every query (e.g. "Rafaela, Argentina")
    pub query_suffix: Option<String>,
    /// User-Agent header; Nominatim's usage policy requires one
    pub user_agent: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("REPARTO_DATABASE_URL")?;
        let redis_url = get_env_or_default("REPARTO_REDIS_URL", "redis://127.0.0.1:6379");
        let host = get_env_or_default("REPARTO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("REPARTO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("REPARTO_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("REPARTO_PORT".to_string(), e.to_string()))?;

        let jwt_secret = get_validated_secret("REPARTO_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "REPARTO_JWT_SECRET")?;

        let depot = depot_from_env()?;
        let geocoding = GeocodingConfig::from_env();

        Ok(Self {
            database_url,
            redis_url,
            host,
            port,
            jwt_secret,
            depot,
            geocoding,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeocodingConfig {
    fn from_env() -> Self {
        Self {
            base_url: get_env_or_default(
                "REPARTO_GEOCODER_URL",
                "https://nominatim.openstreetmap.org",
            ),
            query_suffix: get_optional_env("REPARTO_GEOCODER_SUFFIX"),
            user_agent: get_env_or_default(
                "REPARTO_GEOCODER_USER_AGENT",
                concat!("reparto-server/", env!("CARGO_PKG_VERSION")),
            ),
        }
    }
}

fn depot_from_env() -> Result<Coordinates, ConfigError> {
    let lat = parse_env_or_default("REPARTO_DEPOT_LAT", DEFAULT_DEPOT_LAT)?;
    let lng = parse_env_or_default("REPARTO_DEPOT_LNG", DEFAULT_DEPOT_LNG)?;

    Coordinates::new(lat, lng).map_err(|e: CoordinatesError| {
        ConfigError::InvalidEnvVar("REPARTO_DEPOT_LAT/LNG".to_string(), e.to_string())
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that the token signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real signing keys are randomly generated and have high entropy.
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn shannon_entropy_of_repeated_char_is_zero() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shannon_entropy_of_random_string_is_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn secret_strength_rejects_placeholders() {
        assert!(validate_secret_strength("your-signing-key-here", "TEST_VAR").is_err());
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn secret_strength_rejects_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn secret_strength_accepts_random_secret() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn jwt_secret_length_is_enforced() {
        let short = SecretString::from("short");
        assert!(validate_jwt_secret(&short, "TEST_JWT").is_err());

        let long_enough = SecretString::from("a".repeat(32));
        assert!(validate_jwt_secret(&long_enough, "TEST_JWT").is_ok());
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            jwt_secret: SecretString::from("x".repeat(32)),
            depot: Coordinates::new(DEFAULT_DEPOT_LAT, DEFAULT_DEPOT_LNG).unwrap(),
            geocoding: GeocodingConfig {
                base_url: "https://nominatim.openstreetmap.org".to_string(),
                query_suffix: Some("Rafaela, Argentina".to_string()),
                user_agent: "reparto-server/test".to_string(),
            },
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn default_depot_is_in_range() {
        assert!(Coordinates::new(DEFAULT_DEPOT_LAT, DEFAULT_DEPOT_LNG).is_ok());
    }
}
