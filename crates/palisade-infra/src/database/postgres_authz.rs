//! PostgreSQL implementation of the authorization store.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, IntoActiveModel, QueryFilter, Set};

use palisade_core::domain::{Account, PermissionGrant};
use palisade_core::error::RepoError;
use palisade_core::ports::AuthzStore;

use super::entity::account::{self, Entity as AccountEntity};
use super::entity::permission_grant::{self, Entity as GrantEntity};

/// SeaORM-backed [`AuthzStore`].
pub struct PostgresAuthzStore {
    db: DbConn,
}

impl PostgresAuthzStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn find_account(&self, address: &str) -> Result<Option<account::Model>, RepoError> {
        AccountEntity::find()
            .filter(account::Column::Address.eq(address))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))
    }
}

#[async_trait]
impl AuthzStore for PostgresAuthzStore {
    async fn role_by_address(&self, address: &str) -> Result<Option<String>, RepoError> {
        tracing::debug!(address = %address, "Looking up role");
        Ok(self.find_account(address).await?.map(|m| m.role))
    }

    async fn permissions_by_address(&self, address: &str) -> Result<Vec<String>, RepoError> {
        let grants = GrantEntity::find()
            .filter(permission_grant::Column::Address.eq(address))
            .all(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(grants.into_iter().map(|g| g.permission).collect())
    }

    async fn set_role(&self, address: &str, role: &str) -> Result<(), RepoError> {
        match self.find_account(address).await? {
            Some(model) => {
                let mut active = model.into_active_model();
                active.role = Set(role.to_string());
                active.updated_at = Set(chrono::Utc::now().into());
                active
                    .update(&self.db)
                    .await
                    .map_err(|e| RepoError::Query(e.to_string()))?;
            }
            None => {
                let mut new_account = Account::new(address.to_string());
                new_account.role = role.to_string();
                let active: account::ActiveModel = new_account.into();
                active
                    .insert(&self.db)
                    .await
                    .map_err(|e| RepoError::Query(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn grant_permission(&self, address: &str, permission: &str) -> Result<(), RepoError> {
        let existing = GrantEntity::find()
            .filter(permission_grant::Column::Address.eq(address))
            .filter(permission_grant::Column::Permission.eq(permission))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if existing.is_some() {
            return Ok(());
        }

        let grant = PermissionGrant::new(address.to_string(), permission.to_string());
        let active: permission_grant::ActiveModel = grant.into();
        active.insert(&self.db).await.map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Constraint("Permission already granted".to_string())
            } else {
                RepoError::Query(err_str)
            }
        })?;

        Ok(())
    }

    async fn revoke_permission(&self, address: &str, permission: &str) -> Result<(), RepoError> {
        GrantEntity::delete_many()
            .filter(permission_grant::Column::Address.eq(address))
            .filter(permission_grant::Column::Permission.eq(permission))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;
        Ok(())
    }

    async fn revoke_all_permissions(&self, address: &str) -> Result<(), RepoError> {
        GrantEntity::delete_many()
            .filter(permission_grant::Column::Address.eq(address))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;
        Ok(())
    }

    async fn delete_account(&self, address: &str) -> Result<(), RepoError> {
        self.revoke_all_permissions(address).await?;

        let result = AccountEntity::delete_many()
            .filter(account::Column::Address.eq(address))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
