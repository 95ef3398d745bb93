//! HTML views.
//!
//! Every page is a plain string built from small helpers. All user-supplied text
//! goes through [`escape`] before it is interpolated.

use std::fmt::Write;

use axum::response::Html;

use crate::{
    core::accounts::Registration,
    entities::{ProductType, product},
    errors::ValidationErrors,
    web::{
        auth::{FORGERY_TOKEN_FIELD, Principal},
        forms::ProductSubmission,
    },
};
use sea_orm::Iterable;

/// Escapes text for use in HTML content and attribute values.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, principal: Option<&Principal>, body: &str) -> Html<String> {
    let account = principal.map_or_else(String::new, account_nav);

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Product Tracker</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/Products">Products</a>
{account}
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn account_nav(principal: &Principal) -> String {
    match (principal.user(), principal.csrf_token()) {
        (Some(user), Some(token)) => format!(
            r#"<span>Hello {first_name}!</span>
<form method="post" action="/Account/Logout">{token}<button type="submit">Log out</button></form>"#,
            first_name = escape(&user.first_name),
            token = forgery_token_input(token),
        ),
        _ => r#"<a href="/Account/Register">Register</a>
<a href="/Account/Login">Log in</a>"#
            .to_string(),
    }
}

fn forgery_token_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="{FORGERY_TOKEN_FIELD}" value="{}">"#,
        escape(token)
    )
}

fn field_errors(errors: &ValidationErrors, field: &str) -> String {
    errors
        .for_field(field)
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .collect()
}

fn text_input(label: &str, name: &str, input_type: &str, value: &str, errors: &ValidationErrors) -> String {
    format!(
        r#"<div><label for="{name}">{label}</label>
<input id="{name}" name="{name}" type="{input_type}" value="{value}">{errors}</div>
"#,
        value = escape(value),
        errors = field_errors(errors, name),
    )
}

fn price_display(price: f64) -> String {
    format!("${price:.2}")
}

/// Landing page.
pub fn home(principal: &Principal) -> Html<String> {
    layout(
        "Home",
        Some(principal),
        r#"<h1>Product Tracker</h1>
<p>Browse the catalog on the <a href="/Products">products page</a>.</p>"#,
    )
}

/// Generic error page listing one or more messages.
pub fn error_page<S: AsRef<str>>(messages: &[S]) -> Html<String> {
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>\n", escape(m.as_ref())))
        .collect();

    layout(
        "Error",
        None,
        &format!("<h1>Error</h1>\n<ul class=\"errors\">\n{items}</ul>"),
    )
}

/// Product list, with management links for administrators.
pub fn product_index(
    principal: &Principal,
    products: &[product::Model],
    can_manage: bool,
) -> Html<String> {
    let mut body = String::from("<h1>Products</h1>\n");
    if can_manage {
        body.push_str(r#"<p><a href="/Products/Create">Create New</a></p>"#);
        body.push('\n');
    }

    body.push_str(
        "<table>\n<thead><tr><th>Name</th><th>Description</th><th>Price</th><th>Type</th><th></th></tr></thead>\n<tbody>\n",
    );
    for product in products {
        let id = product.product_id;
        let mut links = format!(r#"<a href="/Products/Details/{id}">Details</a>"#);
        if can_manage {
            let _ = write!(
                links,
                r#" | <a href="/Products/Edit/{id}">Edit</a> | <a href="/Products/Delete/{id}">Delete</a>"#
            );
        }

        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{links}</td></tr>",
            escape(&product.product_name),
            escape(product.product_description.as_deref().unwrap_or_default()),
            price_display(product.price),
            product.product_type.as_str(),
        );
    }
    body.push_str("</tbody>\n</table>");

    layout("Products", Some(principal), &body)
}

fn product_summary(product: &product::Model) -> String {
    format!(
        r"<dl>
<dt>Product Name</dt><dd>{name}</dd>
<dt>Product Description</dt><dd>{description}</dd>
<dt>Price</dt><dd>{price}</dd>
<dt>Product Type</dt><dd>{product_type}</dd>
</dl>",
        name = escape(&product.product_name),
        description = escape(product.product_description.as_deref().unwrap_or_default()),
        price = price_display(product.price),
        product_type = product.product_type.as_str(),
    )
}

/// A single product.
pub fn product_details(
    principal: &Principal,
    product: &product::Model,
    can_manage: bool,
) -> Html<String> {
    let mut body = format!("<h1>Details</h1>\n{}\n<p>", product_summary(product));
    if can_manage {
        let _ = write!(
            body,
            r#"<a href="/Products/Edit/{}">Edit</a> | "#,
            product.product_id
        );
    }
    body.push_str(r#"<a href="/Products">Back to List</a></p>"#);

    layout("Details", Some(principal), &body)
}

fn product_type_select(selected: &str, errors: &ValidationErrors) -> String {
    let options: String = ProductType::iter()
        .map(|t| {
            let marker = if t.as_str().eq_ignore_ascii_case(selected.trim()) {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{0}"{marker}>{0}</option>"#, t.as_str())
        })
        .collect();

    format!(
        r#"<div><label for="ProductType">Product Type</label>
<select id="ProductType" name="ProductType"><option value="">-- Select --</option>{options}</select>{errors}</div>
"#,
        errors = field_errors(errors, "ProductType"),
    )
}

fn product_form(
    action: &str,
    submit_label: &str,
    principal: &Principal,
    submission: &ProductSubmission,
    errors: &ValidationErrors,
) -> String {
    let token = principal.csrf_token().map(forgery_token_input).unwrap_or_default();
    let product_id = submission
        .product_id
        .as_deref()
        .map(|id| {
            format!(
                r#"<input type="hidden" name="ProductID" value="{}">"#,
                escape(id)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<form method="post" action="{action}">
{token}
{product_id}
{name}{description}{price}{product_type}<button type="submit">{submit_label}</button>
</form>
<p><a href="/Products">Back to List</a></p>"#,
        name = text_input("Product Name", "ProductName", "text", &submission.product_name, errors),
        description = text_input(
            "Product Description",
            "ProductDescription",
            "text",
            &submission.product_description,
            errors,
        ),
        price = text_input("Price", "Price", "text", &submission.price, errors),
        product_type = product_type_select(&submission.product_type, errors),
    )
}

/// Create form, blank or redisplayed with the rejected submission.
pub fn product_create(
    principal: &Principal,
    submission: &ProductSubmission,
    errors: &ValidationErrors,
) -> Html<String> {
    let body = format!(
        "<h1>Create Product</h1>\n{}",
        product_form("/Products/Create", "Create", principal, submission, errors)
    );
    layout("Create", Some(principal), &body)
}

/// Edit form for product `product_id`.
pub fn product_edit(
    principal: &Principal,
    product_id: i32,
    submission: &ProductSubmission,
    errors: &ValidationErrors,
) -> Html<String> {
    let body = format!(
        "<h1>Edit Product</h1>\n{}",
        product_form(
            &format!("/Products/Edit/{product_id}"),
            "Save",
            principal,
            submission,
            errors,
        )
    );
    layout("Edit", Some(principal), &body)
}

/// Delete confirmation.
pub fn product_delete(principal: &Principal, product: &product::Model) -> Html<String> {
    let token = principal.csrf_token().map(forgery_token_input).unwrap_or_default();
    let body = format!(
        r#"<h1>Delete</h1>
<h3>Are you sure you want to delete this?</h3>
{summary}
<form method="post" action="/Products/Delete/{id}">
{token}
<button type="submit">Delete</button> | <a href="/Products">Back to List</a>
</form>"#,
        summary = product_summary(product),
        id = product.product_id,
    );
    layout("Delete", Some(principal), &body)
}

/// Sign-in form.
pub fn login(
    principal: &Principal,
    email: &str,
    return_url: Option<&str>,
    error: Option<&str>,
) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="errors">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let return_url = return_url
        .map(|url| {
            format!(
                r#"<input type="hidden" name="ReturnUrl" value="{}">"#,
                escape(url)
            )
        })
        .unwrap_or_default();
    let none = ValidationErrors::new();

    let body = format!(
        r#"<h1>Log in</h1>
{error}
<form method="post" action="/Account/Login">
{return_url}
{email}{password}<button type="submit">Log in</button>
</form>
<p><a href="/Account/Register">Register as a new user</a></p>"#,
        email = text_input("Email", "Email", "email", email, &none),
        password = text_input("Password", "Password", "password", "", &none),
    );
    layout("Log in", Some(principal), &body)
}

/// Registration form.
pub fn register(
    principal: &Principal,
    registration: &Registration,
    errors: &ValidationErrors,
) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
<form method="post" action="/Account/Register">
{first}{last}{email}{password}<button type="submit">Register</button>
</form>"#,
        first = text_input("First Name", "FirstName", "text", &registration.first_name, errors),
        last = text_input("Last Name", "LastName", "text", &registration.last_name, errors),
        email = text_input("Email", "Email", "email", &registration.email, errors),
        password = text_input("Password", "Password", "password", "", errors),
    );
    layout("Register", Some(principal), &body)
}

/// Shown to signed-in users who lack the role a page requires.
pub fn access_denied(principal: &Principal) -> Html<String> {
    layout(
        "Access Denied",
        Some(principal),
        "<h1>Access Denied</h1>\n<p>You do not have access to this resource.</p>",
    )
}
