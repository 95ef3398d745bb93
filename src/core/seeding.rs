//! Startup seeding - Makes sure the fixed roles, and optionally an administrator, exist.
//!
//! Both routines check before they create, so they run on every startup without
//! side effects after the first.

use crate::{
    config::settings::AdminConfig,
    core::{
        accounts::{self, Registration},
        roles::{self, Role},
    },
    entities::app_user,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument};

/// Creates each of [`Role::ALL`] that does not exist yet.
///
/// # Errors
/// Returns an error if a database query or insert fails.
#[instrument(skip(db))]
pub async fn ensure_roles(db: &DatabaseConnection) -> Result<()> {
    for role in Role::ALL {
        if roles::role_exists(db, role).await? {
            debug!(role = %role, "Role already exists");
            continue;
        }

        roles::create_role(db, role).await?;
    }

    Ok(())
}

/// Ensures the configured administrator can sign in and holds the Admin role.
///
/// An existing account with the same email keeps its password; it only gains the role.
///
/// # Errors
/// Returns an error if:
/// - The account must be created but no password was configured
/// - The configured details fail registration rules
/// - A database operation fails
#[instrument(skip(db, admin), fields(email = %admin.email))]
pub async fn ensure_admin_account(
    db: &DatabaseConnection,
    admin: &AdminConfig,
) -> Result<app_user::Model> {
    let user = if let Some(existing) = accounts::find_user_by_email(db, &admin.email).await? {
        debug!("Administrator account already exists");
        existing
    } else {
        let password = admin.password.clone().ok_or_else(|| Error::Config {
            message: format!(
                "No password configured for administrator {}; set [admin].password or ADMIN_PASSWORD",
                admin.email
            ),
        })?;

        let registration = Registration {
            email: admin.email.clone(),
            password,
            first_name: admin.first_name.clone(),
            last_name: admin.last_name.clone(),
        };
        let created = accounts::create_user(db, &registration)
            .await
            .map_err(|e| match e {
                Error::Validation(errors) => Error::Config {
                    message: format!("Invalid [admin] configuration: {errors}"),
                },
                other => other,
            })?;

        info!("Created administrator account");
        created
    };

    roles::add_user_to_role(db, &user.id, Role::Admin).await?;
    Ok(user)
}
