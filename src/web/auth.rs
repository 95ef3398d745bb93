//! Authorization gate - Who is asking, and may they do this?
//!
//! [`load_principal`] runs in front of every route and turns the session cookie into
//! a [`Principal`] stored in the request extensions. [`require_roles`] is layered onto
//! each gated route and sends anyone without a required role to sign in or to the
//! access-denied page. [`verify_forgery_token`] checks that a mutating form post
//! carries the token of the signed-in session.

use axum::{
    Extension,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::{
    core::{
        accounts,
        roles::{self, Role},
    },
    entities::app_user,
    errors::{Error, Result},
    web::{AppState, forms::FormData},
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "ProductTracker.Session";

/// Name of the hidden form field carrying the forgery-protection token.
pub const FORGERY_TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Sign-in page used when an anonymous visitor reaches a gated route.
pub const LOGIN_PATH: &str = "/Account/Login";

/// Page shown when a signed-in user lacks a required role.
pub const ACCESS_DENIED_PATH: &str = "/Account/AccessDenied";

/// A signed-in user and what they are allowed to do.
#[derive(Clone, Debug)]
pub struct SignedIn {
    /// The account behind the session
    pub user: app_user::Model,
    /// Names of the roles the user holds
    pub roles: Vec<String>,
    /// Token every form rendered for this session must post back
    pub csrf_token: String,
}

/// The caller of the current request.
#[derive(Clone, Debug, Default)]
pub enum Principal {
    /// No valid session cookie
    #[default]
    Anonymous,
    /// A live session
    Authenticated(SignedIn),
}

impl Principal {
    /// Whether the caller holds `role`.
    #[must_use]
    pub fn is_in_role(&self, role: Role) -> bool {
        match self {
            Self::Anonymous => false,
            Self::Authenticated(signed_in) => signed_in
                .roles
                .iter()
                .any(|name| name.eq_ignore_ascii_case(role.name())),
        }
    }

    /// Forgery-protection token for forms rendered to this caller.
    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(signed_in) => Some(&signed_in.csrf_token),
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&app_user::Model> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(signed_in) => Some(&signed_in.user),
        }
    }
}

/// Extracts the session token from the request's `Cookie` headers.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

async fn resolve_principal(state: &AppState, token: Option<String>) -> Result<Principal> {
    let Some(token) = token else {
        return Ok(Principal::Anonymous);
    };

    let Some((session, user)) = accounts::find_session(&state.database, &token).await? else {
        debug!("Ignoring unknown or expired session cookie");
        return Ok(Principal::Anonymous);
    };

    let roles = roles::get_user_roles(&state.database, &user.id).await?;

    Ok(Principal::Authenticated(SignedIn {
        user,
        roles,
        csrf_token: session.csrf_token,
    }))
}

/// Middleware resolving the session cookie into a [`Principal`] request extension.
pub async fn load_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(request.headers());
    let principal = match resolve_principal(&state, token).await {
        Ok(principal) => principal,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Roles a gated route accepts; holding any one of them is enough.
#[derive(Clone, Copy, Debug)]
pub struct RequiredRoles(pub &'static [Role]);

impl RequiredRoles {
    /// Administrators only.
    pub const ADMIN: Self = Self(&[Role::Admin]);
}

/// Middleware admitting only callers that hold one of the [`RequiredRoles`].
///
/// Anonymous callers are redirected to sign in and returned here afterwards; signed-in
/// callers without the role are redirected to the access-denied page.
pub async fn require_roles(
    State(required): State<RequiredRoles>,
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Response {
    if required.0.iter().any(|role| principal.is_in_role(*role)) {
        return next.run(request).await;
    }

    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);

    match principal.user() {
        None => {
            debug!(path, "Anonymous request to gated route");
            Redirect::to(&format!("{LOGIN_PATH}?ReturnUrl={}", encode_query_value(&path)))
                .into_response()
        }
        Some(user) => {
            warn!(user_id = %user.id, path, "Access denied");
            Redirect::to(ACCESS_DENIED_PATH).into_response()
        }
    }
}

/// Checks the posted forgery-protection token against the caller's session.
///
/// # Errors
/// Returns `InvalidForgeryToken` when the caller has no session or the token is
/// missing or different.
pub fn verify_forgery_token(principal: &Principal, form: &FormData) -> Result<()> {
    let expected = principal.csrf_token().ok_or(Error::InvalidForgeryToken)?;
    let submitted = form.get(FORGERY_TOKEN_FIELD).ok_or(Error::InvalidForgeryToken)?;

    if bool::from(expected.as_bytes().ct_eq(submitted.as_bytes())) {
        Ok(())
    } else {
        warn!("Request verification token mismatch");
        Err(Error::InvalidForgeryToken)
    }
}

/// Percent-encodes everything outside the URL unreserved set.
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
