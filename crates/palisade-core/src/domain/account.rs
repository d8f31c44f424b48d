use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known role names.
///
/// `DEFAULT` is the least-privileged role and the fallback whenever a role
/// cannot be resolved. Authorization must never fall back to anything above it.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const MODERATOR: &str = "moderator";
    pub const DEFAULT: &str = "user";

    /// All roles an administrator may assign.
    pub const ASSIGNABLE: &[&str] = &[ADMIN, MODERATOR, DEFAULT];
}

/// Account entity - a wallet-addressed user of the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub address: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with the default role and generated ID.
    pub fn new(address: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            address,
            role: roles::DEFAULT.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single permission granted to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub id: Uuid,
    pub address: String,
    pub permission: String,
    pub created_at: DateTime<Utc>,
}

impl PermissionGrant {
    pub fn new(address: String, permission: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
            permission,
            created_at: Utc::now(),
        }
    }
}
