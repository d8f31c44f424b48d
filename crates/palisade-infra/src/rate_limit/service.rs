//! Rate limit facade - the single entry point callers use.

use std::time::Duration;

use async_trait::async_trait;

use palisade_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

use super::{
    AtomicRedisLimiter, FixedWindowLimiter, RateLimitProvider, RateLimitSettings,
    RestSlidingLimiter, detect_provider,
};

/// Facade over the three rate-limiting backends.
///
/// Owns one instance of every configured backend for the process lifetime;
/// the composition root decides how many services exist (normally one).
/// Callers never learn which backend served a check - the decision shape is
/// identical across all of them. Backend errors propagate; an unreachable
/// store never silently downgrades to another backend.
pub struct RateLimitService {
    settings: RateLimitSettings,
    memory: FixedWindowLimiter,
    redis: Option<AtomicRedisLimiter>,
    rest: Option<RestSlidingLimiter>,
}

impl RateLimitService {
    pub fn new(settings: RateLimitSettings) -> Self {
        let redis = settings
            .redis_url
            .clone()
            .map(AtomicRedisLimiter::new);

        let rest = match (&settings.rest_url, &settings.rest_token) {
            (Some(url), Some(token)) => Some(RestSlidingLimiter::new(
                url.clone(),
                token.clone(),
                settings.window,
                settings.max_requests,
            )),
            _ => None,
        };

        Self {
            settings,
            memory: FixedWindowLimiter::new(),
            redis,
            rest,
        }
    }

    pub fn from_env() -> Self {
        Self::new(RateLimitSettings::from_env())
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Check with the configured default window and cap.
    pub async fn check(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        self.check_with(key, self.settings.window, self.settings.max_requests)
            .await
    }

    /// Check with per-call overrides. The sliding backend keeps its
    /// configured pair regardless.
    pub async fn check_with(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<RateLimitDecision, RateLimitError> {
        // Configuration does not change at runtime; selection is cheap
        // enough to resolve on every call.
        match detect_provider(&self.settings) {
            RateLimitProvider::RemoteAtomic => match &self.redis {
                Some(limiter) => limiter.check(key, window, max_requests).await,
                None => Err(RateLimitError::Backend(
                    "Redis backend not constructed".to_string(),
                )),
            },
            RateLimitProvider::RemoteSliding => match &self.rest {
                Some(limiter) => limiter.check(key, window, max_requests).await,
                None => Err(RateLimitError::Backend(
                    "REST backend not constructed".to_string(),
                )),
            },
            RateLimitProvider::InProcess => self.memory.check(key, window, max_requests).await,
        }
    }

    /// Tear down the remote-atomic connection if one was opened. A no-op for
    /// the other backends.
    pub async fn close(&self) {
        if let Some(redis) = &self.redis {
            redis.close().await;
        }
    }
}

#[async_trait]
impl RateLimiter for RateLimitService {
    async fn check(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<RateLimitDecision, RateLimitError> {
        self.check_with(key, window, max_requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_process_service(max_requests: u32) -> RateLimitService {
        RateLimitService::new(RateLimitSettings {
            window: Duration::from_millis(60_000),
            max_requests,
            ..RateLimitSettings::default()
        })
    }

    #[tokio::test]
    async fn test_defaults_flow_through_the_facade() {
        let service = in_process_service(5);

        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = service.check("u1").await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.limit, 5);
            assert_eq!(decision.remaining, expected_remaining);

            // An interleaved request for another identifier never touches
            // u1's window.
            assert!(service.check("u2").await.unwrap().allowed);
        }

        let blocked = service.check("u1").await.unwrap();
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
    }

    #[tokio::test]
    async fn test_per_call_overrides() {
        let service = in_process_service(100);

        let decision = service
            .check_with("burst", Duration::from_millis(1_000), 2)
            .await
            .unwrap();
        assert_eq!(decision.limit, 2);
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test]
    async fn test_close_without_remote_backend_is_a_noop() {
        let service = in_process_service(5);
        service.close().await;

        // Still serving checks afterwards.
        assert!(service.check("k").await.unwrap().allowed);
    }
}
