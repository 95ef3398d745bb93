//! Application user entity - An identity record extended with a person's name.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// UUID assigned at registration
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Email address as entered
    pub email: String,
    /// Upper-cased email used for lookups
    #[sea_orm(unique)]
    pub normalized_email: String,
    /// Argon2 PHC-format password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between users and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user holds many role assignments
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRoles,
    /// One user may have many open sessions
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
