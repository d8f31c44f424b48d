//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use palisade_infra::RateLimitProvider;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Which throttling backend this process resolved at startup.
    pub rate_limit_backend: &'static str,
    pub timestamp: String,
}

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let backend = match palisade_infra::detect_provider(state.rate_limiter.settings()) {
        RateLimitProvider::RemoteAtomic => "redis",
        RateLimitProvider::RemoteSliding => "rest",
        RateLimitProvider::InProcess => "in-process",
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rate_limit_backend: backend,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
