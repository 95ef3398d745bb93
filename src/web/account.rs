//! Account pages - Sign in, registration, sign out and the access-denied page.

use axum::{
    Extension, Form,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    core::accounts,
    errors::{Error, Result, ValidationErrors},
    web::{
        AppState,
        auth::{Principal, SESSION_COOKIE, session_token, verify_forgery_token},
        forms::{FormData, bind_registration},
        views,
    },
};

const INVALID_LOGIN: &str = "Invalid login attempt.";

/// Query string of the sign-in page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Local path to return to after signing in
    #[serde(rename = "ReturnUrl")]
    pub return_url: Option<String>,
}

/// `return_url` when it points inside this site, otherwise `/`.
fn local_return_url(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") => {
            url
        }
        _ => "/",
    }
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// Opens a session for `user_id` and redirects with its cookie set.
async fn sign_in_and_redirect(state: &AppState, user_id: &str, target: &str) -> Result<Response> {
    let (token, _) = accounts::create_session(&state.database, user_id, state.session_ttl).await?;
    let cookie = session_cookie(&token, state.session_ttl.num_seconds());

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response())
}

/// `GET /Account/Login`
pub async fn login_form(
    Extension(principal): Extension<Principal>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    views::login(&principal, "", query.return_url.as_deref(), None)
}

/// `POST /Account/Login`
#[instrument(skip_all)]
pub async fn login_submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<FormData>,
) -> Result<Response> {
    let email = form.value("Email");
    let return_url = form.get("ReturnUrl");

    match accounts::authenticate(&state.database, &email, form.get("Password").unwrap_or_default())
        .await?
    {
        Some(user) => {
            info!(user_id = %user.id, "User signed in");
            sign_in_and_redirect(&state, &user.id, local_return_url(return_url)).await
        }
        None => Ok(views::login(&principal, &email, return_url, Some(INVALID_LOGIN)).into_response()),
    }
}

/// `GET /Account/Register`
pub async fn register_form(Extension(principal): Extension<Principal>) -> Html<String> {
    views::register(
        &principal,
        &accounts::Registration::default(),
        &ValidationErrors::new(),
    )
}

/// `POST /Account/Register`
#[instrument(skip_all)]
pub async fn register_submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<FormData>,
) -> Result<Response> {
    let registration = bind_registration(&form);

    match accounts::register_user(&state.database, &registration).await {
        Ok(user) => sign_in_and_redirect(&state, &user.id, "/").await,
        Err(Error::Validation(errors)) => {
            Ok(views::register(&principal, &registration, &errors).into_response())
        }
        Err(e) => Err(e),
    }
}

/// `POST /Account/Logout`
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    Form(form): Form<FormData>,
) -> Result<Response> {
    verify_forgery_token(&principal, &form)?;

    if let Some(token) = session_token(&headers) {
        accounts::delete_session(&state.database, &token).await?;
    }
    if let Some(user) = principal.user() {
        info!(user_id = %user.id, "User signed out");
    }

    Ok(([(header::SET_COOKIE, session_cookie("", 0))], Redirect::to("/")).into_response())
}

/// `GET /Account/AccessDenied`
pub async fn access_denied(Extension(principal): Extension<Principal>) -> Html<String> {
    views::access_denied(&principal)
}
