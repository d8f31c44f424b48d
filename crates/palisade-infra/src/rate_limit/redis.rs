//! Remote atomic rate limiter backed by a TCP Redis server.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, Script};
use tokio::sync::Mutex;

use palisade_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

use super::epoch_ms;

const KEY_PREFIX: &str = "rl";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed rate limiter.
///
/// Counting happens server-side in one atomic script, so every process
/// sharing the server observes the same window. The connection is created on
/// the first check, configured for a single retry with no offline buffering
/// (a broken connection fails fast instead of queueing), and reused until
/// [`AtomicRedisLimiter::close`].
pub struct AtomicRedisLimiter {
    url: String,
    conn: Mutex<Option<ConnectionManager>>,
    /// Lua script for atomic increment with expiry.
    script: Script,
}

impl AtomicRedisLimiter {
    pub fn new(url: String) -> Self {
        // Returns: [post_increment_count, remaining_ttl_ms]
        let script = Script::new(
            r#"
            local key = KEYS[1]
            local window_ms = tonumber(ARGV[1])

            local current = redis.call('INCR', key)
            if current == 1 then
                redis.call('PEXPIRE', key, window_ms)
            end

            local ttl = redis.call('PTTL', key)
            return {current, ttl}
            "#,
        );

        Self {
            url,
            conn: Mutex::new(None),
            script,
        }
    }

    /// Get the shared connection, creating it on first use.
    ///
    /// The lock is held across creation so concurrent first-callers serialize
    /// behind one in-flight connect and only one connection ever exists.
    async fn connection(&self) -> Result<ConnectionManager, RateLimitError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let client = Client::open(self.url.as_str())
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new_with_config(client, config);
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, conn_manager_fut)
            .await
            .map_err(|_| RateLimitError::Backend("Connection timed out".to_string()))?
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        tracing::info!(url = %self.url, "Connected to Redis rate limiter");

        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Close the connection if one was opened. Subsequent checks reconnect.
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        if guard.take().is_some() {
            tracing::debug!("Redis rate limiter connection closed");
        }
    }
}

#[async_trait]
impl RateLimiter for AtomicRedisLimiter {
    async fn check(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let redis_key = format!("{}:{}", KEY_PREFIX, key);
        let mut conn = self.connection().await?;

        let reply: Vec<i64> = self
            .script
            .key(&redis_key)
            .arg(window.as_millis() as u64)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let count = reply.first().copied().unwrap_or(1);
        let ttl_ms = reply.get(1).copied().unwrap_or(-1);

        Ok(decision_from_reply(
            count,
            ttl_ms,
            epoch_ms(),
            window,
            max_requests,
        ))
    }
}

/// Map the script reply to a decision.
///
/// A negative TTL means the store reported no expiry for the key; the reset
/// then defaults to one full window from now.
fn decision_from_reply(
    count: i64,
    ttl_ms: i64,
    now_ms: i64,
    window: Duration,
    max_requests: u32,
) -> RateLimitDecision {
    let reset_at_ms = if ttl_ms >= 0 {
        now_ms + ttl_ms
    } else {
        now_ms + window.as_millis() as i64
    };

    let count = u32::try_from(count).unwrap_or(u32::MAX);
    let allowed = count <= max_requests;

    RateLimitDecision {
        allowed,
        limit: max_requests,
        remaining: max_requests.saturating_sub(count),
        reset_at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_below_cap_is_allowed() {
        let decision = decision_from_reply(3, 45_000, 1_000, Duration::from_millis(60_000), 10);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 7);
        assert_eq!(decision.reset_at_ms, 46_000);
    }

    #[test]
    fn test_reply_over_cap_is_blocked() {
        let decision = decision_from_reply(11, 45_000, 1_000, Duration::from_millis(60_000), 10);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_cap_is_inclusive() {
        let decision = decision_from_reply(10, 45_000, 1_000, Duration::from_millis(60_000), 10);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_missing_ttl_defaults_to_full_window() {
        let decision = decision_from_reply(1, -1, 5_000, Duration::from_millis(60_000), 10);
        assert_eq!(decision.reset_at_ms, 65_000);
    }

    async fn get_test_limiter() -> Option<AtomicRedisLimiter> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let limiter = AtomicRedisLimiter::new(url);

        // Probe the connection; skip the test when no server is reachable.
        limiter.connection().await.ok()?;
        Some(limiter)
    }

    #[tokio::test]
    async fn test_redis_window_counting() {
        let limiter = match get_test_limiter().await {
            Some(l) => l,
            None => return,
        };

        let key = format!("itest:{}", uuid::Uuid::new_v4());
        let window = Duration::from_millis(1_000);

        let first = limiter.check(&key, window, 2).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        let second = limiter.check(&key, window, 2).await.unwrap();
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        let third = limiter.check(&key, window, 2).await.unwrap();
        assert!(!third.allowed);

        // Wait for reset
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let fourth = limiter.check(&key, window, 2).await.unwrap();
        assert!(fourth.allowed);

        limiter.close().await;
    }
}
