//! Authorization data source port.

use async_trait::async_trait;

use crate::error::RepoError;

/// Authoritative store for roles and permission grants.
///
/// Accounts are keyed by wallet address throughout; the uuid primary key is a
/// storage detail. Implementations back onto the relational database; the
/// read side is normally consumed through the authorization cache rather than
/// directly.
#[async_trait]
pub trait AuthzStore: Send + Sync {
    /// Role assigned to an address, or `None` when the account is unknown.
    async fn role_by_address(&self, address: &str) -> Result<Option<String>, RepoError>;

    /// Permission strings granted to an address. Unknown addresses yield an
    /// empty list, not an error.
    async fn permissions_by_address(&self, address: &str) -> Result<Vec<String>, RepoError>;

    /// Assign a role, creating the account row if it does not exist.
    async fn set_role(&self, address: &str, role: &str) -> Result<(), RepoError>;

    /// Grant a permission. Granting an already-held permission is a no-op.
    async fn grant_permission(&self, address: &str, permission: &str) -> Result<(), RepoError>;

    /// Revoke a single permission.
    async fn revoke_permission(&self, address: &str, permission: &str) -> Result<(), RepoError>;

    /// Revoke every permission held by an address.
    async fn revoke_all_permissions(&self, address: &str) -> Result<(), RepoError>;

    /// Remove the account row and all of its grants.
    async fn delete_account(&self, address: &str) -> Result<(), RepoError>;
}
