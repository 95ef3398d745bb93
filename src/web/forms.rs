//! Form binding - Turning posted fields into typed submissions.
//!
//! Product forms go through [`ProductSubmission::bind`], which copies only the
//! allow-listed product fields out of the posted data. Anything else a client sends
//! along is dropped before it can reach validation or the database.

use serde::Deserialize;
use tracing::debug;

use crate::{
    core::{accounts::Registration, product::ProductFields},
    entities::{ProductType, product},
    errors::ValidationErrors,
};

/// Raw `application/x-www-form-urlencoded` fields, in posted order.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    /// Builds form data from name/value pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// First value posted under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value posted under `name`, or an empty string.
    #[must_use]
    pub fn value(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Iterates over every posted pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The only fields a product create or edit post may set.
pub const PRODUCT_FIELDS: [&str; 5] = [
    "ProductID",
    "ProductName",
    "ProductDescription",
    "Price",
    "ProductType",
];

/// A product form as posted, before parsing.
///
/// Values are kept verbatim so an invalid submission can be shown back to the user
/// exactly as they typed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductSubmission {
    /// Posted `ProductID`, if any
    pub product_id: Option<String>,
    /// Posted `ProductName`
    pub product_name: String,
    /// Posted `ProductDescription`
    pub product_description: String,
    /// Posted `Price`
    pub price: String,
    /// Posted `ProductType`
    pub product_type: String,
}

impl ProductSubmission {
    /// Projects the posted data onto [`PRODUCT_FIELDS`], ignoring every other field.
    ///
    /// Names match case-insensitively and the first occurrence of a field wins.
    #[must_use]
    pub fn bind(form: &FormData) -> Self {
        let mut submission = Self::default();
        let mut seen = [false; PRODUCT_FIELDS.len()];

        for (name, value) in form.pairs() {
            let Some(index) = PRODUCT_FIELDS
                .iter()
                .position(|field| field.eq_ignore_ascii_case(name))
            else {
                debug!(field = name, "Ignoring field outside the product allow-list");
                continue;
            };

            if std::mem::replace(&mut seen[index], true) {
                continue;
            }

            let value = value.to_string();
            match index {
                0 => submission.product_id = Some(value),
                1 => submission.product_name = value,
                2 => submission.product_description = value,
                3 => submission.price = value,
                _ => submission.product_type = value,
            }
        }

        submission
    }

    /// Pre-fills the form from a stored product.
    #[must_use]
    pub fn from_model(model: &product::Model) -> Self {
        Self {
            product_id: Some(model.product_id.to_string()),
            product_name: model.product_name.clone(),
            product_description: model.product_description.clone().unwrap_or_default(),
            price: model.price.to_string(),
            product_type: model.product_type.as_str().to_string(),
        }
    }

    /// The posted `ProductID` as a number; absent or unparseable ids are `None`.
    #[must_use]
    pub fn payload_id(&self) -> Option<i32> {
        self.product_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
    }

    /// Parses the posted values and checks the product rules.
    ///
    /// # Errors
    /// Returns every problem found, keyed by field name.
    pub fn validate(&self) -> Result<ProductFields, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let raw_price = self.price.trim();
        let price = if raw_price.is_empty() {
            errors.add("Price", "The Price field is required.");
            None
        } else if let Ok(price) = raw_price.parse::<f64>() {
            Some(price)
        } else {
            errors.add("Price", format!("The value '{raw_price}' is not valid for Price."));
            None
        };

        let raw_type = self.product_type.trim();
        let product_type = if raw_type.is_empty() {
            errors.add("ProductType", "The Product Type field is required.");
            None
        } else {
            let parsed = ProductType::parse(raw_type);
            if parsed.is_none() {
                errors.add(
                    "ProductType",
                    format!("'{raw_type}' is not a valid product type."),
                );
            }
            parsed
        };

        let fields = ProductFields {
            product_name: self.product_name.clone(),
            product_description: Some(self.product_description.clone()),
            price: price.unwrap_or_default(),
            product_type: product_type.unwrap_or(ProductType::Other),
        };
        if let Err(rule_errors) = fields.validate() {
            errors.extend(rule_errors);
        }

        errors.into_result().map(|()| fields)
    }
}

/// Binds the registration form.
#[must_use]
pub fn bind_registration(form: &FormData) -> Registration {
    Registration {
        email: form.value("Email"),
        password: form.value("Password"),
        first_name: form.value("FirstName"),
        last_name: form.value("LastName"),
    }
}
