//! Backend configuration
//!
//! Resolves the backend base URL once at startup and carries the dispatcher
//! defaults (request timeout and cache TTL).

use std::time::Duration;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_TTL;

/// Explicit base URL override
pub const API_URL_VAR: &str = "TIKI_API_URL";

/// Legacy name for the base URL override
pub const API_BASE_URL_VAR: &str = "TIKI_API_BASE_URL";

/// Deployment environment; `production` or `prod` selects the deployed backend
pub const ENV_VAR: &str = "TIKI_ENV";

/// Deployed backend used in production when no override is set
pub const PRODUCTION_BASE_URL: &str = "https://ecommerce-scraper-82ig.onrender.com";

/// Local backend used outside production when no override is set
pub const LOCAL_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Errors raised while building the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL is not an absolute http(s) URL
    #[error("Invalid backend URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidBaseUrl(String),
}

/// Settings shared by every request issued through a dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Backend origin without a trailing slash
    pub base_url: String,
    /// Timeout applied to calls that don't set their own
    pub timeout: Duration,
    /// Lifetime of cached responses
    pub cache_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl ApiConfig {
    /// Builds a configuration for an explicit base URL
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Builds the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = resolve_base_url(|name| std::env::var(name).ok());
        Self::with_base_url(&base_url)
    }

    /// Overrides the default timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the cache TTL
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Picks the base URL from a variable lookup.
///
/// Priority order:
/// 1. `TIKI_API_URL`
/// 2. `TIKI_API_BASE_URL` (legacy name)
/// 3. the deployed backend when `TIKI_ENV` is `production` or `prod`
/// 4. the local backend
///
/// Blank values are skipped.
pub fn resolve_base_url<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = non_blank(API_URL_VAR).or_else(|| non_blank(API_BASE_URL_VAR)) {
        return url;
    }

    let production = non_blank(ENV_VAR)
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false);

    if production {
        PRODUCTION_BASE_URL.to_string()
    } else {
        LOCAL_BASE_URL.to_string()
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}
