//! Sliding-window rate limiter over an HTTP key-value service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use palisade_core::ports::{RateLimitDecision, RateLimitError, RateLimiter};

use super::epoch_ms;

/// Weighted two-bucket sliding window, evaluated server-side.
///
/// Returns: [allowed(0/1), remaining, reset_at_ms]
const SLIDING_WINDOW_SCRIPT: &str = r#"
local current_key = KEYS[1]
local previous_key = KEYS[2]
local max_requests = tonumber(ARGV[1])
local now_ms = tonumber(ARGV[2])
local window_ms = tonumber(ARGV[3])

local current = tonumber(redis.call('GET', current_key) or '0')
local previous = tonumber(redis.call('GET', previous_key) or '0')

local elapsed = (now_ms % window_ms) / window_ms
local weighted = math.floor(previous * (1 - elapsed)) + current
local reset_ms = (math.floor(now_ms / window_ms) + 1) * window_ms

if weighted >= max_requests then
    return {0, 0, reset_ms}
end

current = redis.call('INCR', current_key)
if current == 1 then
    redis.call('PEXPIRE', current_key, window_ms * 2)
end

local remaining = max_requests - weighted - 1
if remaining < 0 then
    remaining = 0
end
return {1, remaining, reset_ms}
"#;

/// Sliding-window limiter delegating all bookkeeping to a REST key-value
/// service (bearer-token authenticated, Upstash-style command API).
///
/// The window/cap pair is fixed at construction; per-call overrides passed
/// through the [`RateLimiter`] trait are ignored by this backend. The client
/// performs no I/O until the first check.
pub struct RestSlidingLimiter {
    client: reqwest::Client,
    url: String,
    token: String,
    window: Duration,
    max_requests: u32,
}

impl RestSlidingLimiter {
    pub fn new(url: String, token: String, window: Duration, max_requests: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            token,
            window,
            max_requests,
        }
    }

    /// Record the check for usage analytics without touching the request
    /// path. The task is detached: a failure is logged at debug level and
    /// never reaches the caller.
    fn spawn_analytics(&self, key: &str, bucket: i64) {
        let client = self.client.clone();
        let url = format!("{}/pipeline", self.url.trim_end_matches('/'));
        let token = self.token.clone();
        let identifier = key.to_string();
        let event_key = format!("rl:events:{}", bucket);
        let ttl_ms = (self.window.as_millis() * 2).to_string();

        tokio::spawn(async move {
            let body = json!([["INCR", event_key], ["PEXPIRE", event_key, ttl_ms]]);
            let sent = client.post(&url).bearer_auth(&token).json(&body).send().await;
            match sent {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => tracing::debug!(
                    identifier = %identifier,
                    status = %resp.status(),
                    "Rate limit analytics write rejected"
                ),
                Err(e) => tracing::debug!(
                    identifier = %identifier,
                    error = %e,
                    "Rate limit analytics write failed"
                ),
            }
        });
    }
}

#[async_trait]
impl RateLimiter for RestSlidingLimiter {
    async fn check(
        &self,
        key: &str,
        _window: Duration,
        _max_requests: u32,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now = epoch_ms();
        let window_ms = self.window.as_millis() as i64;
        let bucket = now / window_ms;

        let current_key = format!("rl:sw:{}:{}", key, bucket);
        let previous_key = format!("rl:sw:{}:{}", key, bucket - 1);

        let command = json!([
            "EVAL",
            SLIDING_WINDOW_SCRIPT,
            "2",
            current_key,
            previous_key,
            self.max_requests.to_string(),
            now.to_string(),
            window_ms.to_string(),
        ]);

        let reply: RestReply = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?
            .json()
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let decision = decision_from_reply(reply, self.max_requests)?;

        self.spawn_analytics(key, bucket);

        Ok(decision)
    }
}

/// Reply envelope of the REST command API.
#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode the `[allowed, remaining, reset_at_ms]` script reply.
///
/// The service reports the verdict directly; no window arithmetic happens on
/// this side.
fn decision_from_reply(reply: RestReply, limit: u32) -> Result<RateLimitDecision, RateLimitError> {
    if let Some(error) = reply.error {
        return Err(RateLimitError::Backend(error));
    }

    let values = reply
        .result
        .as_ref()
        .and_then(Value::as_array)
        .ok_or_else(|| RateLimitError::Backend("Malformed reply from REST store".to_string()))?;

    let field = |index: usize| {
        values.get(index).and_then(int_value).ok_or_else(|| {
            RateLimitError::Backend(format!("Missing field {} in REST reply", index))
        })
    };

    let allowed = field(0)? == 1;
    let remaining = u32::try_from(field(1)?).unwrap_or(0);
    let reset_at_ms = field(2)?;

    Ok(RateLimitDecision {
        allowed,
        limit,
        remaining,
        reset_at_ms,
    })
}

/// The command API serializes Lua integers as JSON numbers, but proxies have
/// been seen stringifying them.
fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str) -> RestReply {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_decodes_allowed_reply() {
        let decision = decision_from_reply(reply(r#"{"result": [1, 7, 120000]}"#), 10).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.limit, 10);
        assert_eq!(decision.remaining, 7);
        assert_eq!(decision.reset_at_ms, 120_000);
    }

    #[test]
    fn test_decodes_blocked_reply() {
        let decision = decision_from_reply(reply(r#"{"result": [0, 0, 120000]}"#), 10).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_stringified_numbers_are_accepted() {
        let decision =
            decision_from_reply(reply(r#"{"result": ["1", "3", "120000"]}"#), 5).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 3);
    }

    #[test]
    fn test_error_reply_propagates() {
        let result = decision_from_reply(reply(r#"{"error": "unauthorized"}"#), 10);
        assert!(matches!(result, Err(RateLimitError::Backend(msg)) if msg == "unauthorized"));
    }

    #[test]
    fn test_malformed_reply_is_an_error() {
        assert!(decision_from_reply(reply(r#"{"result": 42}"#), 10).is_err());
        assert!(decision_from_reply(reply(r#"{"result": [1]}"#), 10).is_err());
    }
}
