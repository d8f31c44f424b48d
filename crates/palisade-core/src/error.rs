//! Domain-level error types.

use thiserror::Error;

/// Failures surfaced by the authoritative data store.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("no such entity")]
    NotFound,

    #[error("constraint violated: {0}")]
    Constraint(String),
}
