//! Application configuration loaded from environment variables.

use palisade_infra::DatabaseConfig;
use palisade_infra::rate_limit::RateLimitSettings;

/// Everything the server reads from the environment, resolved once at
/// startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` when `DATABASE_URL` is unset; the state falls back to the
    /// in-memory authorization store.
    pub database: Option<DatabaseConfig>,
    pub rate_limit: RateLimitSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "127.0.0.1"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            rate_limit: RateLimitSettings::from_env(),
        }
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}
