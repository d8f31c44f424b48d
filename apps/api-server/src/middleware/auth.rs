//! Session extraction.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use palisade_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated session extractor.
///
/// Carries only the verified wallet address. The role is deliberately not
/// part of the session - handlers resolve it through the authorization cache
/// so role changes apply without re-issuing tokens.
#[derive(Debug, Clone)]
pub struct Identity {
    pub address: String,
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::InvalidToken("expected a Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        tracing::error!("AppState missing from app data");
        AppError::Internal("server configuration error".to_string())
    })?;

    let claims = state.tokens.verify(bearer_token(req)?)?;

    Ok(Identity {
        address: claims.address,
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
