//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment
//! (Cloud Run secret bindings), so everything is read once at startup.

use std::env;

/// Days a pending earning stays redeemable.
pub const DEFAULT_EARNING_EXPIRY_DAYS: i64 = 7;

/// Upper bound on `EARNING_EXPIRY_DAYS` (about a century).
pub const MAX_EARNING_EXPIRY_DAYS: i64 = 36_500;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Optional JSON file overriding the built-in reward schedule
    pub phase_table_path: Option<String>,
    /// Days after which unredeemed earnings expire
    pub earning_expiry_days: i64,

    // --- Secrets ---
    /// Shared HS256 key used by the auth provider to sign session tokens
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            phase_table_path: None,
            earning_expiry_days: DEFAULT_EARNING_EXPIRY_DAYS,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Config used by tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let earning_expiry_days = match env::var("EARNING_EXPIRY_DAYS") {
            Ok(raw) => parse_expiry_days(&raw)?,
            Err(_) => DEFAULT_EARNING_EXPIRY_DAYS,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            phase_table_path: env::var("PHASE_TABLE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            earning_expiry_days,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

fn parse_expiry_days(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(days) if (0..=MAX_EARNING_EXPIRY_DAYS).contains(&days) => Ok(days),
        _ => Err(ConfigError::Invalid {
            name: "EARNING_EXPIRY_DAYS",
            value: raw.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
