//! In-process fixed-window rate limiter.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use palisade_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

use super::epoch_ms;

/// One counting window for a single identifier.
///
/// Replaced wholesale once the window has elapsed; `reset_at_ms` is never
/// extended by requests arriving inside the window.
#[derive(Debug)]
struct WindowRecord {
    count: u32,
    reset_at_ms: i64,
}

/// Per-key fixed-window counter.
///
/// This is the fallback when no remote backend is configured. Limits are
/// per-process, not distributed across instances, and reset at fixed window
/// boundaries - a burst of up to 2x the cap can cross a boundary. State is
/// lost on restart.
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, WindowRecord>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now = epoch_ms();
        // Sync lock with no await inside: this backend never suspends.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(record) = windows.get_mut(key) {
            if now <= record.reset_at_ms {
                if record.count >= max_requests {
                    return Ok(RateLimitDecision {
                        allowed: false,
                        limit: max_requests,
                        remaining: 0,
                        reset_at_ms: record.reset_at_ms,
                    });
                }

                record.count += 1;
                return Ok(RateLimitDecision {
                    allowed: true,
                    limit: max_requests,
                    remaining: max_requests.saturating_sub(record.count),
                    reset_at_ms: record.reset_at_ms,
                });
            }
        }

        // Fresh key or elapsed window: start a new one.
        let reset_at_ms = now + window.as_millis() as i64;
        windows.insert(
            key.to_string(),
            WindowRecord {
                count: 1,
                reset_at_ms,
            },
        );

        Ok(RateLimitDecision {
            allowed: true,
            limit: max_requests,
            remaining: max_requests.saturating_sub(1),
            reset_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60_000);

    #[tokio::test]
    async fn test_counts_down_then_blocks() {
        let limiter = FixedWindowLimiter::new();

        let first = limiter.check("u1", WINDOW, 5).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 4);
        let reset = first.reset_at_ms;

        for expected_remaining in [3, 2, 1, 0] {
            let res = limiter.check("u1", WINDOW, 5).await.unwrap();
            assert!(res.allowed);
            assert_eq!(res.remaining, expected_remaining);
            assert_eq!(res.reset_at_ms, reset);
        }

        // Sixth request in the same window is blocked, window untouched.
        let blocked = limiter.check("u1", WINDOW, 5).await.unwrap();
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.reset_at_ms, reset);
    }

    #[tokio::test]
    async fn test_cap_is_inclusive() {
        let limiter = FixedWindowLimiter::new();

        // With a cap of 1, the first request passes and the second is blocked.
        assert!(limiter.check("k", WINDOW, 1).await.unwrap().allowed);
        assert!(!limiter.check("k", WINDOW, 1).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_window_elapse_resets_counter() {
        let limiter = FixedWindowLimiter::new();
        let window = Duration::from_millis(50);

        assert!(limiter.check("k", window, 1).await.unwrap().allowed);
        assert!(!limiter.check("k", window, 1).await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let res = limiter.check("k", window, 1).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = FixedWindowLimiter::new();

        for _ in 0..5 {
            assert!(limiter.check("u1", WINDOW, 5).await.unwrap().allowed);
        }
        assert!(!limiter.check("u1", WINDOW, 5).await.unwrap().allowed);

        // A different identifier is unaffected by u1 being exhausted.
        let other = limiter.check("u2", WINDOW, 5).await.unwrap();
        assert!(other.allowed);
        assert_eq!(other.remaining, 4);

        // And u1 stays blocked.
        assert!(!limiter.check("u1", WINDOW, 5).await.unwrap().allowed);
    }
}
