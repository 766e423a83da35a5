//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HOTMEAL_API_BASE_URL` - Backend root URL (e.g., `http://localhost:5000/api`)
//!
//! ## Optional
//! - `HOTMEAL_TIMEOUT_SECS` - Request timeout in seconds (default: 5)
//! - `HOTMEAL_STATE_DIR` - Directory for persisted client state (default: `.hotmeal`)
//! - `HOTMEAL_CLIENT_KIND` - `admin` or `customer` (default: customer)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::guard::ClientKind;

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_STATE_DIR: &str = ".hotmeal";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root URL
    pub api_base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Where persisted state lives
    pub state_dir: PathBuf,
    /// Admin console or customer app
    pub client_kind: ClientKind,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = get_required(&lookup, "HOTMEAL_API_BASE_URL")?;
        let api_base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("HOTMEAL_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "HOTMEAL_API_BASE_URL".to_string(),
                format!("unsupported scheme {}", api_base_url.scheme()),
            ));
        }

        let timeout_secs =
            get_or_default(&lookup, "HOTMEAL_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("HOTMEAL_TIMEOUT_SECS".to_string(), e.to_string())
                })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HOTMEAL_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let client_kind = get_or_default(&lookup, "HOTMEAL_CLIENT_KIND", "customer")
            .parse::<ClientKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOTMEAL_CLIENT_KIND".to_string(), e))?;

        Ok(Self {
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
            state_dir: PathBuf::from(get_or_default(
                &lookup,
                "HOTMEAL_STATE_DIR",
                DEFAULT_STATE_DIR,
            )),
            client_kind,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
        })
    }

    /// Login route for the configured client kind.
    #[must_use]
    pub const fn login_path(&self) -> &'static str {
        self.client_kind.login_path()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}
