//! Shared test utilities for the product tracker.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test entities with sensible defaults, and driving the router in-process.

use crate::{
    core::{
        accounts::{self, Registration},
        product::{self, ProductFields},
        roles::{self, Role},
        seeding,
    },
    entities::{self, ProductType},
    errors::Result,
    web::{
        self, AppState,
        auth::{FORGERY_TOKEN_FIELD, SESSION_COOKIE, encode_query_value},
    },
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceExt;

/// Password given to every user created by these helpers.
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Like [`setup_test_db`], with the fixed roles already seeded.
pub async fn setup_seeded_db() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    seeding::ensure_roles(&db).await?;
    Ok(db)
}

/// The "Widget" product used throughout the tests.
///
/// # Defaults
/// * `product_name`: "Widget"
/// * `product_description`: "A widget"
/// * `price`: 9.99
/// * `product_type`: Tool
pub fn widget_fields() -> ProductFields {
    widget_fields_named("Widget")
}

/// [`widget_fields`] with a different name.
pub fn widget_fields_named(name: &str) -> ProductFields {
    ProductFields {
        product_name: name.to_string(),
        product_description: Some("A widget".to_string()),
        price: 9.99,
        product_type: ProductType::Tool,
    }
}

/// Creates a test product named `name` with the widget defaults.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, widget_fields_named(name)).await
}

/// Creates a user with no roles and [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::app_user::Model> {
    accounts::create_user(
        db,
        &Registration {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await
}

/// Creates a user holding `role`. Roles must already be seeded.
pub async fn create_user_in_role(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
) -> Result<entities::app_user::Model> {
    let user = create_test_user(db, email).await?;
    roles::add_user_to_role(db, &user.id, role).await?;
    Ok(user)
}

/// Opens a one-hour session for `user_id`.
/// Returns (cookie token, session row).
pub async fn sign_in(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<(String, entities::session::Model)> {
    accounts::create_session(db, user_id, Duration::hours(1)).await
}

/// Cookie and forgery token of a signed-in test client.
#[derive(Clone, Debug)]
pub struct Browser {
    /// Raw session token
    pub token: String,
    /// Token the session expects on posted forms
    pub csrf_token: String,
}

impl Browser {
    /// A client presenting `token` as its session cookie, with no known forgery token.
    pub fn from_token(token: &str) -> Self {
        Self {
            token: token.to_string(),
            csrf_token: String::new(),
        }
    }

    /// Encodes `fields` plus this client's forgery token as a form body.
    pub fn form(&self, fields: &[(&str, &str)]) -> String {
        let mut pairs = fields.to_vec();
        pairs.push((FORGERY_TOKEN_FIELD, self.csrf_token.as_str()));
        encode_form(&pairs)
    }

    fn cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.token)
    }
}

/// Encodes `fields` as `application/x-www-form-urlencoded`.
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(name, value)| format!("{}={}", encode_query_value(name), encode_query_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// What a test needs from a response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// `Location` header, for redirects
    pub location: Option<String>,
    /// `Set-Cookie` header, if any
    pub set_cookie: Option<String>,
    /// Body as text
    pub body: String,
}

/// The full router over a seeded in-memory database.
pub struct TestApp {
    /// Database behind the router
    pub db: Arc<DatabaseConnection>,
    router: Router,
}

impl TestApp {
    /// Builds the app with one-hour sessions.
    pub async fn new() -> Result<Self> {
        let db = Arc::new(setup_seeded_db().await?);
        let router = web::router(AppState {
            database: Arc::clone(&db),
            session_ttl: Duration::hours(1),
        });
        Ok(Self { db, router })
    }

    /// Creates a user in `role` and signs them in.
    pub async fn browser(&self, email: &str, role: Role) -> Result<Browser> {
        let user = create_user_in_role(&self.db, email, role).await?;
        let (token, session) = sign_in(&self.db, &user.id).await?;
        Ok(Browser {
            token,
            csrf_token: session.csrf_token,
        })
    }

    /// Sends a GET to `uri`.
    pub async fn get(&self, uri: &str, browser: Option<&Browser>) -> Result<TestResponse> {
        self.send(Method::GET, uri, browser, None).await
    }

    /// Posts an encoded form body to `uri`.
    pub async fn post_form(
        &self,
        uri: &str,
        browser: Option<&Browser>,
        body: &str,
    ) -> Result<TestResponse> {
        self.send(Method::POST, uri, browser, Some(body.to_string()))
            .await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        browser: Option<&Browser>,
        body: Option<String>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(browser) = browser {
            builder = builder.header(header::COOKIE, browser.cookie());
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        }
        let request = builder
            .body(Body::from(body.unwrap_or_default()))
            .map_err(std::io::Error::other)?;

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        };
        let status = response.status();
        let location = header_text(header::LOCATION);
        let set_cookie = header_text(header::SET_COOKIE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(std::io::Error::other)?;

        Ok(TestResponse {
            status,
            location,
            set_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
