//! Database layer - SeaORM connection management and the Postgres
//! authorization store.

mod connections;
pub mod entity;
mod postgres_authz;

pub use connections::DatabaseConfig;
pub use postgres_authz::PostgresAuthzStore;
