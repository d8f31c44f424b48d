//! JWT session token service.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use palisade_core::ports::{AuthError, SessionClaims, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "palisade-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string());
        if secret == DEV_SECRET {
            tracing::warn!("Using the development JWT secret. Set JWT_SECRET for production.");
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "palisade-api".to_string()),
        }
    }
}

/// On-the-wire claim set.
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    /// Wallet address.
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// Signs and verifies wallet-address session tokens.
///
/// Tokens carry the address and nothing else. Roles and permissions are
/// resolved per request through the authorization cache, so a role change
/// applies to sessions issued before it.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: TimeDelta,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer,
            lifetime: TimeDelta::hours(config.expiration_hours),
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, address: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = WireClaims {
            sub: address.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(SessionClaims {
            address: data.claims.sub,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_issuer(issuer: &str) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: issuer.to_string(),
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service_with_issuer("test-issuer");

        let token = service.issue("0xabc123").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.address, "0xabc123");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = service_with_issuer("test-issuer");

        assert!(matches!(
            service.verify("not-a-token").unwrap_err(),
            AuthError::InvalidToken(_)
        ));
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        // Same secret, different issuer: the token must not cross over.
        let token = service_with_issuer("issuer-a").issue("0xabc").unwrap();
        assert!(service_with_issuer("issuer-b").verify(&token).is_err());
    }

    #[test]
    fn test_expiration_seconds() {
        assert_eq!(service_with_issuer("t").expiration_seconds(), 3600);
    }
}
