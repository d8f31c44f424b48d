//! Permission grant entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "permission_grants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub address: String,
    pub permission: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for palisade_core::domain::PermissionGrant {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            address: model.address,
            permission: model.permission,
            created_at: model.created_at.into(),
        }
    }
}

impl From<palisade_core::domain::PermissionGrant> for ActiveModel {
    fn from(grant: palisade_core::domain::PermissionGrant) -> Self {
        Self {
            id: Set(grant.id),
            address: Set(grant.address),
            permission: Set(grant.permission),
            created_at: Set(grant.created_at.into()),
        }
    }
}
