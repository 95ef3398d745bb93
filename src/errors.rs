//! Unified error type for the product tracker.
//!
//! Expected request outcomes (missing identifiers, unknown products, tampered edits,
//! concurrent edits) are variants here alongside genuine failures, so handlers can
//! decide per variant whether to render an error view or fail the request.

use std::fmt;

use thiserror::Error;

/// Which product page asked for an identifier that was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductAction {
    /// Details page
    View,
    /// Edit form
    Edit,
    /// Delete confirmation
    Delete,
}

impl fmt::Display for ProductAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => f.write_str("view"),
            Self::Edit => f.write_str("edit"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// A single rule violation on a submitted form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name as posted (e.g. `ProductName`)
    pub field: &'static str,
    /// Message shown next to the field
    pub message: String,
}

/// Every rule violation found on one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty set of errors.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Records a violation for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Folds another set of violations into this one.
    pub fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// True when no violation has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded for `field`, in insertion order.
    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All recorded violations.
    #[must_use]
    pub fn all(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise the collected errors.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// Application error type shared by the domain and web layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("No product id was supplied to {action}")]
    MissingParameter { action: ProductAction },

    #[error("Product not found: {id}")]
    ProductNotFound { id: i32 },

    #[error("Route id {route_id:?} does not match submitted product id {payload_id:?}")]
    IdentityMismatch {
        route_id: Option<i32>,
        payload_id: Option<i32>,
    },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Product {id} was modified by another request")]
    ConcurrencyConflict { id: i32 },

    #[error("Missing or invalid request verification token")]
    InvalidForgeryToken,

    #[error("Role not found: {name}")]
    RoleNotFound { name: String },

    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
