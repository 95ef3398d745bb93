//! Landing page.

use axum::{Extension, response::Html};

use crate::web::{auth::Principal, views};

/// `GET /`
pub async fn index(Extension(principal): Extension<Principal>) -> Html<String> {
    views::home(&principal)
}
