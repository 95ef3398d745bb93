//! Authorization roles and role membership.
//!
//! The application knows exactly two roles. They live in the `roles` table so that
//! membership can be queried like any other relation, but the set itself is fixed in
//! code by [`Role`].

use std::fmt;

use crate::{
    entities::{IdentityRole, UserRole, role, user_role},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, instrument};

/// One of the application's fixed authorization roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// May create, edit and delete products
    Admin,
    /// Registered shopper; read-only access to the catalog
    Customer,
}

impl Role {
    /// Every role the application defines.
    pub const ALL: [Self; 2] = [Self::Admin, Self::Customer];

    /// Role name as stored and displayed.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Customer => "Customer",
        }
    }

    /// Upper-cased name used for lookups.
    #[must_use]
    pub fn normalized_name(self) -> String {
        normalize(self.name())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Looks up the stored row for `role`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_role(db: &DatabaseConnection, role: Role) -> Result<Option<role::Model>> {
    IdentityRole::find()
        .filter(role::Column::NormalizedName.eq(role.normalized_name()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether `role` has a stored row.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn role_exists(db: &DatabaseConnection, role: Role) -> Result<bool> {
    Ok(find_role(db, role).await?.is_some())
}

/// Inserts a row for `role`.
///
/// # Errors
/// Returns an error if the insert fails, including when the role already exists.
#[instrument(skip(db))]
pub async fn create_role(db: &DatabaseConnection, role: Role) -> Result<role::Model> {
    let model = role::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        name: Set(role.name().to_string()),
        normalized_name: Set(role.normalized_name()),
    };
    let created = model.insert(db).await?;

    info!(role = %role, "Created role");
    Ok(created)
}

/// Grants `role` to a user. Granting a role the user already holds is a no-op.
///
/// # Errors
/// Returns an error if the role has not been created or the database write fails.
#[instrument(skip(db))]
pub async fn add_user_to_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<()> {
    let stored = find_role(db, role)
        .await?
        .ok_or_else(|| Error::RoleNotFound {
            name: role.name().to_string(),
        })?;

    let existing = UserRole::find_by_id((user_id.to_string(), stored.id.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        debug!(user_id, role = %role, "User already holds role");
        return Ok(());
    }

    user_role::ActiveModel {
        user_id: Set(user_id.to_string()),
        role_id: Set(stored.id),
    }
    .insert(db)
    .await?;

    info!(user_id, role = %role, "Added user to role");
    Ok(())
}

/// Names of every role the user holds.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user_roles(db: &DatabaseConnection, user_id: &str) -> Result<Vec<String>> {
    let roles = IdentityRole::find()
        .inner_join(UserRole)
        .filter(user_role::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    Ok(roles.into_iter().map(|r| r.name).collect())
}

/// Whether the user holds `role`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn is_in_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<bool> {
    let roles = get_user_roles(db, user_id).await?;
    Ok(roles.iter().any(|name| normalize(name) == role.normalized_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_find_role() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(!role_exists(&db, Role::Admin).await?);
        let created = create_role(&db, Role::Admin).await?;
        assert_eq!(created.name, "Admin");
        assert_eq!(created.normalized_name, "ADMIN");

        assert!(role_exists(&db, Role::Admin).await?);
        assert!(!role_exists(&db, Role::Customer).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_role_is_rejected_by_store() -> Result<()> {
        let db = setup_test_db().await?;

        create_role(&db, Role::Customer).await?;
        let result = create_role(&db, Role::Customer).await;
        assert!(matches!(result, Err(Error::Database(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_user_to_role_is_idempotent() -> Result<()> {
        let db = setup_seeded_db().await?;
        let user = create_test_user(&db, "shopper@example.com").await?;

        add_user_to_role(&db, &user.id, Role::Customer).await?;
        add_user_to_role(&db, &user.id, Role::Customer).await?;

        assert_eq!(get_user_roles(&db, &user.id).await?, vec!["Customer"]);
        assert!(is_in_role(&db, &user.id, Role::Customer).await?);
        assert!(!is_in_role(&db, &user.id, Role::Admin).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_user_to_missing_role_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "early@example.com").await?;

        let result = add_user_to_role(&db, &user.id, Role::Admin).await;
        assert!(matches!(result, Err(Error::RoleNotFound { .. })));

        Ok(())
    }
}
