//! Web layer - Routes, extractors and HTML rendering on top of [`crate::core`].
//!
//! Handlers stay thin: they bind form data, call into `core`, and pick a view.

pub mod account;
pub mod auth;
pub mod errors;
pub mod forms;
pub mod home;
pub mod products;
pub mod views;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use chrono::Duration;
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;

use auth::{RequiredRoles, load_principal, require_roles};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, shared by every clone of the state
    pub database: Arc<DatabaseConnection>,
    /// Lifetime of a sign-in session
    pub session_ttl: Duration,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/Products/Create",
            get(products::create_form).post(products::create_submit),
        )
        .route("/Products/Edit", get(products::edit_form))
        .route(
            "/Products/Edit/:id",
            get(products::edit_form).post(products::edit_submit),
        )
        .route("/Products/Delete", get(products::delete_form))
        .route(
            "/Products/Delete/:id",
            get(products::delete_form).post(products::delete_confirm),
        )
        .route_layer(middleware::from_fn_with_state(
            RequiredRoles::ADMIN,
            require_roles,
        ));

    let public = Router::new()
        .route("/", get(home::index))
        .route("/Home", get(home::index))
        .route("/Home/Index", get(home::index))
        .route("/Products", get(products::index))
        .route("/Products/Index", get(products::index))
        .route("/Products/Details", get(products::details))
        .route("/Products/Details/:id", get(products::details))
        .route(
            "/Account/Login",
            get(account::login_form).post(account::login_submit),
        )
        .route(
            "/Account/Register",
            get(account::register_form).post(account::register_submit),
        )
        .route("/Account/Logout", post(account::logout))
        .route("/Account/AccessDenied", get(account::access_denied));

    public
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), load_principal))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{product, roles::Role},
        errors::Result,
        test_utils::*,
    };
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_state_clones_share_one_database() -> Result<()> {
        let state = AppState {
            database: Arc::new(setup_seeded_db().await?),
            session_ttl: Duration::hours(1),
        };
        let copy = state.clone();

        create_test_product(&copy.database, "Shared").await?;

        assert!(Arc::ptr_eq(&state.database, &copy.database));
        assert_eq!(product::get_all_products(&state.database).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_home_routes() -> Result<()> {
        let app = TestApp::new().await?;

        for path in ["/", "/Home", "/Home/Index"] {
            let response = app.get(path, None).await?;
            assert_eq!(response.status, StatusCode::OK, "{path}");
            assert!(response.body.contains("Product Tracker"));
            assert!(response.body.contains("Log in"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_signed_in_nav_greets_user() -> Result<()> {
        let app = TestApp::new().await?;
        let browser = app.browser("shopper@example.com", Role::Customer).await?;

        let response = app.get("/", Some(&browser)).await?;
        assert!(response.body.contains("Hello Test!"));
        assert!(response.body.contains(&browser.csrf_token));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_cookie_is_anonymous() -> Result<()> {
        let app = TestApp::new().await?;
        let stranger = Browser::from_token("not-a-session");

        let response = app.get("/Products/Create", Some(&stranger)).await?;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert!(
            response
                .location
                .is_some_and(|location| location.starts_with("/Account/Login"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_can_browse_but_not_manage() -> Result<()> {
        let app = TestApp::new().await?;
        let customer = app.browser("shopper@example.com", Role::Customer).await?;

        let list = app.get("/Products", Some(&customer)).await?;
        assert_eq!(list.status, StatusCode::OK);

        for path in ["/Products/Create", "/Products/Edit/1", "/Products/Delete/1"] {
            let response = app.get(path, Some(&customer)).await?;
            assert_eq!(response.status, StatusCode::SEE_OTHER, "{path}");
            assert_eq!(response.location.as_deref(), Some("/Account/AccessDenied"));
        }
        Ok(())
    }
}
