//! Read-through authorization cache.

use std::sync::Arc;
use std::time::Duration;

use palisade_core::domain::roles;
use palisade_core::error::RepoError;
use palisade_core::ports::AuthzStore;

use crate::cache::LruTtlCache;

/// Sizing for the two authorization caches.
#[derive(Debug, Clone)]
pub struct AuthzCacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for AuthzCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Duration::from_secs(60),
        }
    }
}

/// Caches role and permission lookups in front of the authoritative store.
///
/// One instance lives for the process lifetime, owned by the composition
/// root. Reads are read-through: a miss queries the store and populates the
/// cache. Writes go to the store first and evict the affected entries before
/// returning, so the next request on this process observes the new value;
/// other processes converge within the TTL.
pub struct AuthzCache {
    store: Arc<dyn AuthzStore>,
    roles: LruTtlCache<String>,
    perms: LruTtlCache<Vec<String>>,
}

fn role_key(address: &str) -> String {
    format!("role:{}", address)
}

fn perms_key(address: &str) -> String {
    format!("perms:{}", address)
}

impl AuthzCache {
    pub fn new(store: Arc<dyn AuthzStore>, config: AuthzCacheConfig) -> Self {
        Self {
            store,
            roles: LruTtlCache::new(config.max_entries, config.ttl),
            perms: LruTtlCache::new(config.max_entries, config.ttl),
        }
    }

    /// Resolve the role for an address.
    ///
    /// A missing account or a store failure resolves to the default role -
    /// the least privileged one, so a degraded database can never elevate
    /// anyone. The resolved value is cached either way.
    pub async fn role_for(&self, address: &str) -> String {
        let key = role_key(address);
        if let Some(role) = self.roles.get(&key) {
            return role;
        }

        let role = match self.store.role_by_address(address).await {
            Ok(Some(role)) => role,
            Ok(None) => roles::DEFAULT.to_string(),
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Role lookup failed, using default role");
                roles::DEFAULT.to_string()
            }
        };

        self.roles.set(&key, role.clone());
        role
    }

    /// Resolve the permission grants for an address.
    ///
    /// Store failures propagate here - callers of the permission path need to
    /// distinguish "no grants" from "could not check".
    pub async fn permissions_for(&self, address: &str) -> Result<Vec<String>, RepoError> {
        let key = perms_key(address);
        if let Some(perms) = self.perms.get(&key) {
            return Ok(perms);
        }

        let perms = self.store.permissions_by_address(address).await?;
        self.perms.set(&key, perms.clone());
        Ok(perms)
    }

    pub async fn has_permission(&self, address: &str, permission: &str) -> Result<bool, RepoError> {
        let perms = self.permissions_for(address).await?;
        Ok(perms.iter().any(|p| p == permission))
    }

    pub async fn is_admin(&self, address: &str) -> bool {
        self.role_for(address).await == roles::ADMIN
    }

    /// Assign a role, evicting the cached value before returning.
    pub async fn assign_role(&self, address: &str, role: &str) -> Result<(), RepoError> {
        self.store.set_role(address, role).await?;
        self.roles.delete(&role_key(address));
        Ok(())
    }

    pub async fn grant_permission(&self, address: &str, permission: &str) -> Result<(), RepoError> {
        self.store.grant_permission(address, permission).await?;
        self.perms.delete(&perms_key(address));
        Ok(())
    }

    pub async fn revoke_permission(
        &self,
        address: &str,
        permission: &str,
    ) -> Result<(), RepoError> {
        self.store.revoke_permission(address, permission).await?;
        self.perms.delete(&perms_key(address));
        Ok(())
    }

    pub async fn revoke_all_permissions(&self, address: &str) -> Result<(), RepoError> {
        self.store.revoke_all_permissions(address).await?;
        self.perms.delete(&perms_key(address));
        Ok(())
    }

    /// Remove the account and every cache entry keyed under its address.
    pub async fn delete_account(&self, address: &str) -> Result<(), RepoError> {
        self.store.delete_account(address).await?;
        self.roles.invalidate_prefix(&role_key(address));
        self.perms.invalidate_prefix(&perms_key(address));
        Ok(())
    }

    /// Drop all cached authorization state.
    pub fn reset(&self) {
        self.roles.clear();
        self.perms.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::authz::MemoryAuthzStore;

    fn cached(store: Arc<dyn AuthzStore>) -> AuthzCache {
        AuthzCache::new(store, AuthzCacheConfig::default())
    }

    /// Store that fails every call, for degraded-database behavior.
    struct FailingStore;

    #[async_trait]
    impl AuthzStore for FailingStore {
        async fn role_by_address(&self, _address: &str) -> Result<Option<String>, RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn permissions_by_address(&self, _address: &str) -> Result<Vec<String>, RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn set_role(&self, _address: &str, _role: &str) -> Result<(), RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn grant_permission(
            &self,
            _address: &str,
            _permission: &str,
        ) -> Result<(), RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn revoke_permission(
            &self,
            _address: &str,
            _permission: &str,
        ) -> Result<(), RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn revoke_all_permissions(&self, _address: &str) -> Result<(), RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }

        async fn delete_account(&self, _address: &str) -> Result<(), RepoError> {
            Err(RepoError::Connection("down".to_string()))
        }
    }

    /// Store counting role lookups, for read-through verification.
    struct CountingStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl AuthzStore for CountingStore {
        async fn role_by_address(&self, _address: &str) -> Result<Option<String>, RepoError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Some(roles::ADMIN.to_string()))
        }

        async fn permissions_by_address(&self, _address: &str) -> Result<Vec<String>, RepoError> {
            Ok(vec![])
        }

        async fn set_role(&self, _address: &str, _role: &str) -> Result<(), RepoError> {
            Ok(())
        }

        async fn grant_permission(
            &self,
            _address: &str,
            _permission: &str,
        ) -> Result<(), RepoError> {
            Ok(())
        }

        async fn revoke_permission(
            &self,
            _address: &str,
            _permission: &str,
        ) -> Result<(), RepoError> {
            Ok(())
        }

        async fn revoke_all_permissions(&self, _address: &str) -> Result<(), RepoError> {
            Ok(())
        }

        async fn delete_account(&self, _address: &str) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_role_read_through_populates_the_cache() {
        let store = Arc::new(CountingStore {
            lookups: AtomicUsize::new(0),
        });
        let authz = cached(store.clone());

        assert_eq!(authz.role_for("0xabc").await, roles::ADMIN);
        assert_eq!(authz.role_for("0xabc").await, roles::ADMIN);
        assert_eq!(authz.role_for("0xabc").await, roles::ADMIN);

        // Only the first call reached the store.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_account_gets_default_role() {
        let authz = cached(Arc::new(MemoryAuthzStore::new()));
        assert_eq!(authz.role_for("0xnobody").await, roles::DEFAULT);
    }

    #[tokio::test]
    async fn test_store_failure_resolves_to_default_role() {
        let authz = cached(Arc::new(FailingStore));
        assert_eq!(authz.role_for("0xabc").await, roles::DEFAULT);
    }

    #[tokio::test]
    async fn test_permission_store_failure_propagates() {
        let authz = cached(Arc::new(FailingStore));
        assert!(authz.permissions_for("0xabc").await.is_err());
    }

    #[tokio::test]
    async fn test_role_change_is_visible_immediately() {
        let store = Arc::new(MemoryAuthzStore::new());
        let authz = cached(store);

        authz.assign_role("0xabc", roles::DEFAULT).await.unwrap();
        assert_eq!(authz.role_for("0xabc").await, roles::DEFAULT);

        // The mutation invalidates the cached value before returning, so the
        // next read sees the new role without waiting out the TTL.
        authz.assign_role("0xabc", roles::ADMIN).await.unwrap();
        assert_eq!(authz.role_for("0xabc").await, roles::ADMIN);
    }

    #[tokio::test]
    async fn test_grant_and_revoke_invalidate_permissions() {
        let store = Arc::new(MemoryAuthzStore::new());
        let authz = cached(store);

        assert!(!authz.has_permission("0xabc", "nft:mint").await.unwrap());

        authz.grant_permission("0xabc", "nft:mint").await.unwrap();
        assert!(authz.has_permission("0xabc", "nft:mint").await.unwrap());

        authz.revoke_permission("0xabc", "nft:mint").await.unwrap();
        assert!(!authz.has_permission("0xabc", "nft:mint").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_account_evicts_both_caches() {
        let store = Arc::new(MemoryAuthzStore::new());
        let authz = cached(store);

        authz.assign_role("0xabc", roles::ADMIN).await.unwrap();
        authz.grant_permission("0xabc", "nft:mint").await.unwrap();
        assert!(authz.is_admin("0xabc").await);
        assert!(authz.has_permission("0xabc", "nft:mint").await.unwrap());

        authz.delete_account("0xabc").await.unwrap();

        assert_eq!(authz.role_for("0xabc").await, roles::DEFAULT);
        assert!(!authz.has_permission("0xabc", "nft:mint").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_clears_cached_state() {
        let store = Arc::new(CountingStore {
            lookups: AtomicUsize::new(0),
        });
        let authz = cached(store.clone());

        authz.role_for("0xabc").await;
        authz.reset();
        authz.role_for("0xabc").await;

        assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
    }
}
