//! Account management - Registration, password verification and sign-in sessions.
//!
//! Passwords are stored as Argon2id PHC strings. A session is identified by a random
//! token held in the browser's cookie; only its SHA-256 digest is persisted, next to
//! a second random token used to verify that form posts came from our own pages.

use crate::{
    core::roles::{self, Role},
    entities::{AppUser, Session, app_user, session},
    errors::{Error, Result, ValidationErrors},
};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use sea_orm::{Set, prelude::*};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const TOKEN_BYTES: usize = 32;

/// Details submitted when opening an account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registration {
    /// Sign-in email
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Given name, required
    pub first_name: String,
    /// Family name, required
    pub last_name: String,
}

impl Registration {
    /// Checks the registration rules.
    ///
    /// # Errors
    /// Returns every violated rule, keyed by posted field name.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.first_name.trim().is_empty() {
            errors.add("FirstName", "First name is required.");
        }
        if self.last_name.trim().is_empty() {
            errors.add("LastName", "Last name is required.");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("Email", "Email is required.");
        } else if !looks_like_email(email) {
            errors.add("Email", "Email is not a valid email address.");
        }

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "Password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long."),
            );
        }

        errors.into_result()
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_uppercase()
}

/// Hashes a password into an Argon2id PHC string.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Runs CPU-heavy password work on the blocking pool, off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::PasswordHash {
            message: format!("Password task failed: {e}"),
        })
}

/// Checks `password` against a stored PHC string. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
}

/// Finds a user by email, ignoring case and surrounding whitespace.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<app_user::Model>> {
    AppUser::find()
        .filter(app_user::Column::NormalizedEmail.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores a new user without granting any role.
///
/// # Errors
/// Returns an error if:
/// - The registration breaks a rule or the email is already taken (`Validation`)
/// - Password hashing or the database insert fails
#[instrument(skip(db, registration), fields(email = %registration.email))]
pub async fn create_user(
    db: &DatabaseConnection,
    registration: &Registration,
) -> Result<app_user::Model> {
    registration.validate().map_err(Error::Validation)?;

    if find_user_by_email(db, &registration.email).await?.is_some() {
        let mut errors = ValidationErrors::new();
        errors.add("Email", "An account with this email already exists.");
        return Err(Error::Validation(errors));
    }

    let password = registration.password.clone();
    let password_hash = run_blocking(move || hash_password(&password)).await??;

    let user = app_user::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        email: Set(registration.email.trim().to_string()),
        normalized_email: Set(normalize_email(&registration.email)),
        password_hash: Set(password_hash),
        first_name: Set(registration.first_name.trim().to_string()),
        last_name: Set(registration.last_name.trim().to_string()),
        created_at: Set(Utc::now()),
    };
    let created = user.insert(db).await?;

    info!(user_id = %created.id, "Created user");
    Ok(created)
}

/// Opens a customer account: creates the user and grants the Customer role.
///
/// # Errors
/// Same as [`create_user`], plus a failure to grant the role.
pub async fn register_user(
    db: &DatabaseConnection,
    registration: &Registration,
) -> Result<app_user::Model> {
    let user = create_user(db, registration).await?;
    roles::add_user_to_role(db, &user.id, Role::Customer).await?;
    Ok(user)
}

/// Returns the user when `email` and `password` match a stored account.
///
/// # Errors
/// Returns an error if the database query fails or the password check cannot run.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<Option<app_user::Model>> {
    let Some(user) = find_user_by_email(db, email).await? else {
        warn!("Sign-in attempt for unknown email");
        return Ok(None);
    };

    let password = password.to_string();
    let stored_hash = user.password_hash.clone();
    let matches = run_blocking(move || verify_password(&password, &stored_hash)).await?;

    if matches {
        Ok(Some(user))
    } else {
        warn!(user_id = %user.id, "Sign-in attempt with wrong password");
        Ok(None)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a cookie token is stored.
#[must_use]
pub fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Opens a session for `user_id` lasting `ttl`.
///
/// Returns the raw cookie token, which is not stored anywhere, and the session row.
///
/// # Errors
/// Returns an error if the database insert fails.
#[instrument(skip(db))]
pub async fn create_session(
    db: &DatabaseConnection,
    user_id: &str,
    ttl: Duration,
) -> Result<(String, session::Model)> {
    let token = generate_token();
    let now = Utc::now();

    let session = session::ActiveModel {
        token_hash: Set(hash_token(&token)),
        user_id: Set(user_id.to_string()),
        csrf_token: Set(generate_token()),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(db)
    .await?;

    info!(user_id, "Opened session");
    Ok((token, session))
}

/// Resolves a cookie token to its unexpired session and user.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_session(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<(session::Model, app_user::Model)>> {
    let found = Session::find_by_id(hash_token(token))
        .filter(session::Column::ExpiresAt.gt(Utc::now()))
        .find_also_related(AppUser)
        .one(db)
        .await?;

    Ok(found.and_then(|(session, user)| user.map(|user| (session, user))))
}

/// Ends the session identified by a cookie token. Unknown tokens are ignored.
///
/// # Errors
/// Returns an error if the database delete fails.
#[instrument(skip(db, token))]
pub async fn delete_session(db: &DatabaseConnection, token: &str) -> Result<()> {
    Session::delete_by_id(hash_token(token)).exec(db).await?;
    Ok(())
}

/// Removes every expired session, returning how many were removed.
///
/// # Errors
/// Returns an error if the database delete fails.
pub async fn purge_expired_sessions(db: &DatabaseConnection) -> Result<u64> {
    let result = Session::delete_many()
        .filter(session::Column::ExpiresAt.lte(Utc::now()))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(count = result.rows_affected, "Purged expired sessions");
    }
    Ok(result.rows_affected)
}
