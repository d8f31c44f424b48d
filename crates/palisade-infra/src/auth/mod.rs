//! Authentication - session token issuance and verification.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
