//! Identity role entity - Named authorization roles ("Admin", "Customer").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    /// UUID assigned when the role is created
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Role name as displayed
    pub name: String,
    /// Upper-cased name used for lookups
    #[sea_orm(unique)]
    pub normalized_name: String,
}

/// Defines relationships between roles and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One role is assigned to many users
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRoles,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
