//! Product pages - List, details, and the two-phase create, edit and delete flows.
//!
//! Every form phase re-reads the store; nothing is cached between the GET that
//! renders a form and the POST that submits it. Expected failures are returned as
//! [`Error`] values and rendered by its `IntoResponse` impl.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{instrument, warn};

use crate::{
    core::{product, roles::Role},
    entities::ProductModel,
    errors::{Error, ProductAction, Result, ValidationErrors},
    web::{
        AppState,
        auth::{Principal, verify_forgery_token},
        forms::{FormData, ProductSubmission},
        views,
    },
};

/// Where successful mutations send the browser.
pub const LIST_PATH: &str = "/Products";

fn require_id(id: Option<Path<i32>>, action: ProductAction) -> Result<i32> {
    id.map(|Path(id)| id).ok_or(Error::MissingParameter { action })
}

async fn find_or_not_found(state: &AppState, id: i32) -> Result<ProductModel> {
    product::get_product_by_id(&state.database, id)
        .await?
        .ok_or(Error::ProductNotFound { id })
}

/// `GET /Products`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Html<String>> {
    let products = product::get_all_products(&state.database).await?;
    Ok(views::product_index(
        &principal,
        &products,
        principal.is_in_role(Role::Admin),
    ))
}

/// `GET /Products/Details/{id?}`
#[instrument(skip(state, principal))]
pub async fn details(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Option<Path<i32>>,
) -> Result<Html<String>> {
    let id = require_id(id, ProductAction::View)?;
    let product = find_or_not_found(&state, id).await?;

    Ok(views::product_details(
        &principal,
        &product,
        principal.is_in_role(Role::Admin),
    ))
}

/// `GET /Products/Create`
pub async fn create_form(Extension(principal): Extension<Principal>) -> Html<String> {
    views::product_create(
        &principal,
        &ProductSubmission::default(),
        &ValidationErrors::new(),
    )
}

/// `POST /Products/Create`
#[instrument(skip_all)]
pub async fn create_submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Form(form): Form<FormData>,
) -> Result<Response> {
    verify_forgery_token(&principal, &form)?;
    let submission = ProductSubmission::bind(&form);

    let fields = match submission.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(views::product_create(&principal, &submission, &errors).into_response());
        }
    };

    match product::create_product(&state.database, fields).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(Error::Validation(errors)) => {
            Ok(views::product_create(&principal, &submission, &errors).into_response())
        }
        Err(e) => Err(e),
    }
}

/// `GET /Products/Edit/{id?}`
#[instrument(skip(state, principal))]
pub async fn edit_form(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Option<Path<i32>>,
) -> Result<Html<String>> {
    let id = require_id(id, ProductAction::Edit)?;
    let product = find_or_not_found(&state, id).await?;

    Ok(views::product_edit(
        &principal,
        id,
        &ProductSubmission::from_model(&product),
        &ValidationErrors::new(),
    ))
}

/// `POST /Products/Edit/{id}`
#[instrument(skip(state, principal, form))]
pub async fn edit_submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Option<Path<i32>>,
    Form(form): Form<FormData>,
) -> Result<Response> {
    verify_forgery_token(&principal, &form)?;
    let submission = ProductSubmission::bind(&form);

    // An unparseable route id can never match the payload
    let route_id = id.map(|Path(id)| id);
    let payload_id = submission.payload_id();
    let id = match route_id {
        Some(id) if payload_id == Some(id) => id,
        _ => {
            warn!(?route_id, ?payload_id, "Edit posted for a different product than the route");
            return Err(Error::IdentityMismatch {
                route_id,
                payload_id,
            });
        }
    };

    let fields = match submission.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(views::product_edit(&principal, id, &submission, &errors).into_response());
        }
    };

    match product::update_product(&state.database, id, fields).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(Error::Validation(errors)) => {
            Ok(views::product_edit(&principal, id, &submission, &errors).into_response())
        }
        Err(e) => Err(e),
    }
}

/// `GET /Products/Delete/{id?}`
#[instrument(skip(state, principal))]
pub async fn delete_form(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Option<Path<i32>>,
) -> Result<Html<String>> {
    let id = require_id(id, ProductAction::Delete)?;
    let product = find_or_not_found(&state, id).await?;

    Ok(views::product_delete(&principal, &product))
}

/// `POST /Products/Delete/{id}`
#[instrument(skip(state, principal, form))]
pub async fn delete_confirm(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Option<Path<i32>>,
    Form(form): Form<FormData>,
) -> Result<Redirect> {
    verify_forgery_token(&principal, &form)?;
    let id = require_id(id, ProductAction::Delete)?;
    product::delete_product(&state.database, id).await?;

    Ok(Redirect::to(LIST_PATH))
}
