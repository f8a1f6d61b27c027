//! Application configuration loaded from environment variables.
//!
//! The JWT signing key is required and checked once at startup so that a
//! misconfigured deployment fails to boot instead of failing per-request.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS
    pub frontend_url: String,

    // --- JWT settings ---
    /// HMAC signing key for access tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// `iss` claim stamped into and required of every access token
    pub jwt_issuer: String,
    /// `aud` claim stamped into and required of every access token
    pub jwt_audience: String,
    /// Access-token lifetime in minutes
    pub jwt_expiry_minutes: i64,
    /// Refresh-token lifetime in days
    pub refresh_token_validity_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECURITY_KEY` is mandatory; everything else has a local-dev
    /// default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            jwt_signing_key: env::var("JWT_SECURITY_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SECURITY_KEY"))?
                .into_bytes(),
            jwt_issuer: env::var("JWT_VALID_ISSUER")
                .unwrap_or_else(|_| "crm-api".to_string()),
            jwt_audience: env::var("JWT_VALID_AUDIENCE")
                .unwrap_or_else(|_| "crm-clients".to_string()),
            jwt_expiry_minutes: env::var("JWT_EXPIRY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            refresh_token_validity_days: env::var("REFRESH_TOKEN_VALIDITY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        })
    }

    /// Fixed config for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            jwt_issuer: "crm-api-test".to_string(),
            jwt_audience: "crm-clients-test".to_string(),
            jwt_expiry_minutes: 60,
            refresh_token_validity_days: 7,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
