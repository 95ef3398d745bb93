//! Session entity - A signed-in browser, identified by a hashed cookie token.
//!
//! The raw token only ever lives in the client's cookie; the table stores its
//! SHA-256 digest. Each session also carries the forgery-protection token that
//! every form rendered for that browser embeds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    /// Base64 SHA-256 digest of the cookie token
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_hash: String,
    /// Signed-in user
    pub user_id: String,
    /// Per-session request verification token
    pub csrf_token: String,
    /// When the session was opened
    pub created_at: DateTimeUtc,
    /// After this instant the session is ignored
    pub expires_at: DateTimeUtc,
}

/// Each session belongs to one user
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The signed-in user
    #[sea_orm(
        belongs_to = "super::app_user::Entity",
        from = "Column::UserId",
        to = "super::app_user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::app_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
