//! Client configuration.

use std::time::Duration;

use url::Url;

/// Default cache lifetime for fetched resources.
///
/// The cache exists to absorb rapid re-renders and navigation churn, not to
/// be a long-lived store, so the default is deliberately short.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Default timeout applied to every outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the API client and fetch layer.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API, e.g. `https://example.com/api/`.
    pub base_url: Url,
    /// Timeout for each outbound HTTP request.
    pub timeout: Duration,
    /// Lifetime of cached fetch results.
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL with defaults.
    ///
    /// The base URL is normalized to end with a trailing slash so that
    /// endpoint paths join under it instead of replacing its last segment.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: normalize_base(base_url),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
