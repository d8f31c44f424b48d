//! Application state - shared across all handlers.

use std::sync::Arc;

use palisade_core::ports::{AuthzStore, TokenService};
use palisade_infra::authz::{AuthzCache, AuthzCacheConfig, MemoryAuthzStore};
use palisade_infra::auth::JwtTokenService;
use palisade_infra::rate_limit::RateLimitService;

#[cfg(feature = "postgres")]
use palisade_infra::database::PostgresAuthzStore;

use crate::config::AppConfig;

/// Shared application state.
///
/// The composition root: every process-lifetime singleton (the rate limiter
/// with its lazy remote connection, the two authorization caches behind
/// `AuthzCache`) is constructed exactly once here and injected downward.
#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<RateLimitService>,
    pub authz: Arc<AuthzCache>,
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let store = Self::build_store(config).await;
        let authz = Arc::new(AuthzCache::new(store, AuthzCacheConfig::default()));

        let rate_limiter = Arc::new(RateLimitService::new(config.rate_limit.clone()));
        tracing::info!(
            provider = ?palisade_infra::detect_provider(rate_limiter.settings()),
            "Rate limiting configured"
        );

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());

        tracing::info!("Application state initialized");

        Self {
            rate_limiter,
            authz,
            tokens,
        }
    }

    #[cfg(feature = "postgres")]
    async fn build_store(config: &AppConfig) -> Arc<dyn AuthzStore> {
        if let Some(db_config) = &config.database {
            match db_config.connect().await {
                Ok(conn) => return Arc::new(PostgresAuthzStore::new(conn)),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        Arc::new(MemoryAuthzStore::new())
    }

    #[cfg(not(feature = "postgres"))]
    async fn build_store(_config: &AppConfig) -> Arc<dyn AuthzStore> {
        tracing::info!("Running without postgres feature - using in-memory authorization store");
        Arc::new(MemoryAuthzStore::new())
    }
}
