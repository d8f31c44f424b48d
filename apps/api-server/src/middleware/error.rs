//! Handler error type and its RFC 7807 mapping.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use palisade_core::error::RepoError;
use palisade_core::ports::AuthError;
use palisade_shared::ErrorResponse;

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Everything a handler can fail with, one variant per response class.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden")]
    Forbidden,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let problem = match self {
            Self::NotFound(detail) => ErrorResponse::not_found(detail),
            Self::BadRequest(detail) => ErrorResponse::bad_request(detail),
            Self::Unauthorized(detail) => ErrorResponse::unauthorized(detail),
            Self::Forbidden => ErrorResponse::forbidden(),
            Self::Conflict(detail) => ErrorResponse::conflict(detail),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Request failed with internal error");
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(problem)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound("resource does not exist".to_string()),
            RepoError::Constraint(msg) => Self::Conflict(msg),
            // Connection and query failures carry store internals; those stay
            // in the logs, not in the response body.
            RepoError::Connection(msg) | RepoError::Query(msg) => {
                tracing::error!(error = %msg, "Authorization store error");
                Self::Internal("authorization store unavailable".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => Self::Forbidden,
            AuthError::TokenExpired => {
                Self::Unauthorized("session token has expired".to_string())
            }
            AuthError::MissingAuth => {
                Self::Unauthorized("missing bearer token".to_string())
            }
            AuthError::InvalidToken(_) => {
                Self::Unauthorized("invalid session token".to_string())
            }
        }
    }
}
