//! HTTP rendering of [`Error`].
//!
//! Expected product outcomes become an error page with status 200, the same way the
//! pages themselves render. Only failures of the store or the server surface as 5xx.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{errors::Error, web::views};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::MissingParameter { action } => {
                views::error_page(&[format!("Please specify a product to {action}!")])
                    .into_response()
            }
            Self::ProductNotFound { .. } => {
                views::error_page(&["This product was not found!"]).into_response()
            }
            Self::IdentityMismatch { .. } => {
                views::error_page(&["There was a problem editing this product!"]).into_response()
            }
            Self::ConcurrencyConflict { .. } => {
                views::error_page(&["There was a problem with your edits!"]).into_response()
            }
            Self::Validation(errors) => {
                let messages: Vec<&str> = errors.all().iter().map(|e| e.message.as_str()).collect();
                (StatusCode::BAD_REQUEST, views::error_page(&messages)).into_response()
            }
            Self::InvalidForgeryToken => (
                StatusCode::BAD_REQUEST,
                views::error_page(&["The request verification token was missing or invalid."]),
            )
                .into_response(),
            other => {
                error!("Request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    views::error_page(&["An unexpected error occurred. Please try again later."]),
                )
                    .into_response()
            }
        }
    }
}
