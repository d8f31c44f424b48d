//! Rate limiting - backend selection, the three backends, and the facade.

mod memory;
mod redis;
mod rest;
mod service;

pub use memory::FixedWindowLimiter;
pub use rest::RestSlidingLimiter;
pub use self::redis::AtomicRedisLimiter;
pub use service::RateLimitService;

use std::time::Duration;

/// Rate limiting configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    /// Redis connection URL. Presence selects the remote atomic backend.
    pub redis_url: Option<String>,
    /// REST key-value endpoint. Selects the sliding-window backend together
    /// with `rest_token`.
    pub rest_url: Option<String>,
    /// Bearer token for the REST endpoint.
    pub rest_token: Option<String>,
    /// Default window duration.
    pub window: Duration,
    /// Default maximum requests per window.
    pub max_requests: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            rest_url: None,
            rest_token: None,
            window: Duration::from_millis(60_000),
            max_requests: 100,
        }
    }
}

impl RateLimitSettings {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: non_empty(std::env::var("REDIS_URL").ok()),
            rest_url: non_empty(std::env::var("UPSTASH_REDIS_REST_URL").ok()),
            rest_token: non_empty(std::env::var("UPSTASH_REDIS_REST_TOKEN").ok()),
            window: Duration::from_millis(
                std::env::var("RATE_LIMIT_WINDOW_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60_000),
            ),
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The backend a process uses for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitProvider {
    /// Atomic counter on a TCP Redis server. Cross-instance consistent.
    RemoteAtomic,
    /// Sliding window delegated to a REST key-value service.
    RemoteSliding,
    /// Per-process fixed window map. The zero-configuration fallback.
    InProcess,
}

/// Pick the backend for the given settings.
///
/// Priority: a TCP URL always wins; the REST backend needs both its URL and
/// token; anything else (including partial REST configuration) falls back to
/// the in-process counter. Missing configuration is not an error.
pub fn detect_provider(settings: &RateLimitSettings) -> RateLimitProvider {
    if settings.redis_url.is_some() {
        return RateLimitProvider::RemoteAtomic;
    }
    if settings.rest_url.is_some() && settings.rest_token.is_some() {
        return RateLimitProvider::RemoteSliding;
    }
    RateLimitProvider::InProcess
}

/// Current unix time in milliseconds.
pub(crate) fn epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
