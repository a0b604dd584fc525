//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `VITRINE_API_URL` - Backend origin (default: `http://localhost:3000`)
//! - `VITRINE_STATE_FILE` - Persisted session file (default: platform data
//!   dir, e.g. `~/.local/share/vitrine/session.json`)
//! - `VITRINE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `VITRINE_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL, `0` disables
//!   (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const STATE_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; every endpoint path is joined onto it
    pub base_url: Url,
    /// Where the token pair and cached user are persisted
    pub state_file: PathBuf,
    /// Timeout applied to each HTTP request
    pub timeout: Duration,
    /// Catalog cache TTL (`None` disables caching)
    pub catalog_ttl: Option<Duration>,
}

impl ClientConfig {
    /// Build a configuration for `base_url` with every other setting at its
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` (keyed `VITRINE_API_URL`) if the
    /// URL is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            state_file: default_state_file(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_ttl: Some(Duration::from_secs(DEFAULT_CATALOG_TTL_SECS)),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get("VITRINE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Some(path) = get("VITRINE_STATE_FILE") {
            if path.trim().is_empty() {
                return Err(ConfigError::InvalidEnvVar(
                    "VITRINE_STATE_FILE".to_string(),
                    "path cannot be empty".to_string(),
                ));
            }
            config.state_file = PathBuf::from(path);
        }

        if let Some(raw) = get("VITRINE_HTTP_TIMEOUT_SECS") {
            let secs = parse_secs("VITRINE_HTTP_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    "VITRINE_HTTP_TIMEOUT_SECS".to_string(),
                    "must be greater than 0".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get("VITRINE_CATALOG_CACHE_TTL_SECS") {
            let secs = parse_secs("VITRINE_CATALOG_CACHE_TTL_SECS", &raw)?;
            config.catalog_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Same configuration, persisting to `path` instead.
    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    /// Same configuration with the catalog cache disabled.
    #[must_use]
    pub const fn without_catalog_cache(mut self) -> Self {
        self.catalog_ttl = None;
        self
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("VITRINE_API_URL".to_string(), reason);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("must be an absolute URL with a host".to_string()));
    }
    Ok(url)
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// `<data dir>/vitrine/session.json`, or `./.vitrine-session.json` when the
/// platform has no data directory.
fn default_state_file() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".vitrine-session.json"),
        |dir| dir.join("vitrine").join(STATE_FILE_NAME),
    )
}
