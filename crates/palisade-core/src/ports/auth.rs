//! Session token port.

/// Claims carried by a session token.
///
/// Deliberately role-free: the role is resolved per request through the
/// authorization cache so that role changes take effect without re-issuing
/// sessions.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub address: String,
    pub exp: i64,
}

/// Token service trait for session token operations.
pub trait TokenService: Send + Sync {
    /// Issue a session token for a verified wallet address.
    fn issue(&self, address: &str) -> Result<String, AuthError>;

    /// Validate and decode a session token.
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;

    /// Lifetime of newly issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}
