//! Client configuration.

use std::time::Duration;

use tablekeep_cache::{CacheConfig, RetryPolicy};
use tablekeep_router::RouteTable;
use tablekeep_session::SessionConfig;
use tracing::warn;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "TABLEKEEP_API_URL";

/// Base URL used when [`API_URL_ENV`] is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Everything a [`Client`](crate::Client) needs, with sensible defaults.
///
/// ```rust
/// use std::time::Duration;
/// use tablekeep::ClientConfig;
///
/// let config = ClientConfig {
///     base_url: "https://api.example.com/".into(),
///     resource_stale_time: Duration::from_secs(30),
///     ..ClientConfig::default()
/// }
/// .validated();
///
/// assert_eq!(config.base_url, "https://api.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the REST API, without a trailing slash.
    ///
    /// Default: `http://localhost:3000/api`.
    pub base_url: String,

    /// The current-user resource. Default: 5 minute stale time, no retry.
    pub session: SessionConfig,

    /// Cache-wide defaults.
    pub cache: CacheConfig,

    /// Login, root, and landing routes.
    pub routes: RouteTable,

    /// Stale time of identity-scoped resources such as reservation lists.
    ///
    /// Default: 60 seconds.
    pub resource_stale_time: Duration,

    /// Retry policy of identity-scoped resources.
    ///
    /// Default: one retry for network failures and 5xx.
    pub resource_retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            session: SessionConfig::default(),
            cache: CacheConfig::default(),
            routes: RouteTable::default(),
            resource_stale_time: Duration::from_secs(60),
            resource_retry: RetryPolicy::retries(1),
        }
    }
}

impl ClientConfig {
    /// The default config with `base_url` taken from `TABLEKEEP_API_URL`
    /// when it is set and non-empty.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            base_url,
            ..Self::default()
        }
        .validated()
    }

    /// Normalizes values so the config is safe to use.
    ///
    /// Trims whitespace and trailing `/` from `base_url`, forces route
    /// paths to be absolute, and clamps retry counts.
    pub fn validated(mut self) -> Self {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.len() != self.base_url.len() {
            self.base_url = trimmed.to_string();
        }
        if self.resource_retry.max_retries > CacheConfig::MAX_RETRIES {
            warn!(
                retries = self.resource_retry.max_retries,
                max = CacheConfig::MAX_RETRIES,
                "resource_retry.max_retries exceeds maximum, clamping"
            );
            self.resource_retry.max_retries = CacheConfig::MAX_RETRIES;
        }
        self.routes = self.routes.validated();
        self.cache = self.cache.validated();
        self
    }
}
