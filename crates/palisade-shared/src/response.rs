//! Wire-level response types shared by the server and its clients.

use serde::{Deserialize, Serialize};

/// Envelope for successful responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Problem Details error body (RFC 7807).
///
/// `retry_after_seconds` is an extension member carried only on throttling
/// responses, mirroring the `Retry-After` header for clients that never look
/// at headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ErrorResponse {
    pub fn problem(status: u16, title: &str) -> Self {
        Self {
            problem_type: "about:blank".to_string(),
            title: title.to_string(),
            status,
            detail: None,
            retry_after_seconds: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::problem(400, "Bad Request").with_detail(detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::problem(401, "Unauthorized").with_detail(detail)
    }

    pub fn forbidden() -> Self {
        Self::problem(403, "Forbidden")
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::problem(404, "Not Found").with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::problem(409, "Conflict").with_detail(detail)
    }

    pub fn too_many_requests(retry_after_seconds: u64) -> Self {
        let mut problem = Self::problem(429, "Too Many Requests")
            .with_detail("Request rate limit exceeded for this client.");
        problem.retry_after_seconds = Some(retry_after_seconds);
        problem
    }

    pub fn internal_error() -> Self {
        Self::problem(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_members_are_not_serialized() {
        let body = serde_json::to_value(ErrorResponse::forbidden()).unwrap();
        assert_eq!(body["status"], 403);
        assert!(body.get("detail").is_none());
        assert!(body.get("retry_after_seconds").is_none());
    }

    #[test]
    fn test_throttling_problem_carries_retry_hint() {
        let body = serde_json::to_value(ErrorResponse::too_many_requests(12)).unwrap();
        assert_eq!(body["status"], 429);
        assert_eq!(body["retry_after_seconds"], 12);
        assert_eq!(body["type"], "about:blank");
    }
}
