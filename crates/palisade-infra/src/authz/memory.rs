//! In-memory authorization store - used when no database is configured.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use palisade_core::error::RepoError;
use palisade_core::ports::AuthzStore;

/// HashMap-backed [`AuthzStore`].
///
/// The fallback when `DATABASE_URL` is unset, and the stand-in store for
/// service-level tests. Data is lost on process restart.
#[derive(Default)]
pub struct MemoryAuthzStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    roles: HashMap<String, String>,
    grants: HashMap<String, HashSet<String>>,
}

impl MemoryAuthzStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthzStore for MemoryAuthzStore {
    async fn role_by_address(&self, address: &str) -> Result<Option<String>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.roles.get(address).cloned())
    }

    async fn permissions_by_address(&self, address: &str) -> Result<Vec<String>, RepoError> {
        let inner = self.inner.read().await;
        let mut perms: Vec<String> = inner
            .grants
            .get(address)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        perms.sort();
        Ok(perms)
    }

    async fn set_role(&self, address: &str, role: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner.roles.insert(address.to_string(), role.to_string());
        Ok(())
    }

    async fn grant_permission(&self, address: &str, permission: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner
            .grants
            .entry(address.to_string())
            .or_default()
            .insert(permission.to_string());
        Ok(())
    }

    async fn revoke_permission(&self, address: &str, permission: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.grants.get_mut(address) {
            set.remove(permission);
        }
        Ok(())
    }

    async fn revoke_all_permissions(&self, address: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner.grants.remove(address);
        Ok(())
    }

    async fn delete_account(&self, address: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner.roles.remove(address);
        inner.grants.remove(address);
        Ok(())
    }
}
