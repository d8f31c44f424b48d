//! # Palisade Infrastructure
//!
//! Concrete implementations of the ports defined in `palisade-core`.
//! This crate contains the rate-limiting backends, the authorization cache,
//! and the database and session-token integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - Caching and in-memory stores only
//! - `postgres` - PostgreSQL authorization store via SeaORM
//! - `auth` - JWT session tokens
//! - `rate-limit` - The rate limiter and its Redis/REST backends

pub mod authz;
pub mod cache;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use authz::{AuthzCache, AuthzCacheConfig, MemoryAuthzStore};
pub use cache::LruTtlCache;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, PostgresAuthzStore};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{RateLimitProvider, RateLimitService, RateLimitSettings, detect_provider};
