//! Product business logic - Handles all product-related operations.
//!
//! This module provides the catalog operations behind the product pages: listing,
//! lookup, creation, editing and deletion. Edits are an explicit read-modify-write
//! guarded by the row's `row_version`, so a concurrent writer is detected instead of
//! silently overwritten. All functions are async and return Result types.

use crate::{
    entities::{Product, ProductType, product},
    errors::{Error, Result, ValidationErrors},
};
use sea_orm::{Set, Unchanged, prelude::*};
use tracing::{info, instrument, warn};

/// The editable fields of a product, as accepted from a create or edit submission.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductFields {
    /// Display name, required
    pub product_name: String,
    /// Optional description
    pub product_description: Option<String>,
    /// Unit price in dollars
    pub price: f64,
    /// Catalog category
    pub product_type: ProductType,
}

impl ProductFields {
    /// Checks the field rules: a non-blank name and a finite, non-negative price.
    ///
    /// # Errors
    /// Returns every violated rule, keyed by posted field name.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.product_name.trim().is_empty() {
            errors.add("ProductName", "Product name is required.");
        }

        if !self.price.is_finite() {
            errors.add("Price", "Price must be a valid number.");
        } else if self.price < 0.0 {
            errors.add("Price", "Price cannot be negative.");
        }

        errors.into_result()
    }

    fn normalized_description(&self) -> Option<String> {
        self.product_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(ToString::to_string)
    }
}

/// Retrieves every product in whatever order the store yields them.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find().all(db).await.map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i32,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether a product with `product_id` is currently stored.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn product_exists(db: &DatabaseConnection, product_id: i32) -> Result<bool> {
    let count = Product::find_by_id(product_id).count(db).await?;
    Ok(count > 0)
}

/// Creates a new product from validated fields; the store assigns the id.
///
/// # Errors
/// Returns an error if:
/// - The fields break a validation rule
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn create_product(
    db: &DatabaseConnection,
    fields: ProductFields,
) -> Result<product::Model> {
    fields.validate().map_err(Error::Validation)?;

    let product = product::ActiveModel {
        product_name: Set(fields.product_name.trim().to_string()),
        product_description: Set(fields.normalized_description()),
        price: Set(fields.price),
        product_type: Set(fields.product_type),
        row_version: Set(1),
        ..Default::default()
    };
    let created = product.insert(db).await?;

    info!(product_id = created.product_id, "Created product");
    Ok(created)
}

/// Replaces the editable fields of an existing product.
///
/// The update only applies if the row still carries the version that was read, so a
/// write that lands in between is reported rather than overwritten.
///
/// # Errors
/// Returns an error if:
/// - The fields break a validation rule
/// - The product does not exist, or was deleted while the update ran
/// - The product was modified concurrently (`ConcurrencyConflict`)
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i32,
    fields: ProductFields,
) -> Result<product::Model> {
    fields.validate().map_err(Error::Validation)?;

    let current = get_product_by_id(db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    save_if_unchanged(db, &current, fields).await
}

/// Writes `fields` over the row `read`, provided its version has not moved since.
async fn save_if_unchanged(
    db: &DatabaseConnection,
    read: &product::Model,
    fields: ProductFields,
) -> Result<product::Model> {
    let product_id = read.product_id;
    let product = product::ActiveModel {
        product_id: Unchanged(product_id),
        product_name: Set(fields.product_name.trim().to_string()),
        product_description: Set(fields.normalized_description()),
        price: Set(fields.price),
        product_type: Set(fields.product_type),
        row_version: Set(read.row_version + 1),
    };

    let result = Product::update(product)
        .filter(product::Column::RowVersion.eq(read.row_version))
        .exec(db)
        .await;

    match result {
        Ok(updated) => {
            info!(product_id, "Updated product");
            Ok(updated)
        }
        Err(DbErr::RecordNotUpdated) => {
            if product_exists(db, product_id).await? {
                warn!(product_id, "Product was modified concurrently, edit dropped");
                Err(Error::ConcurrencyConflict { id: product_id })
            } else {
                warn!(product_id, "Product was deleted while being edited");
                Err(Error::ProductNotFound { id: product_id })
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Permanently removes a product.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist
/// - The database delete operation fails
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i32) -> Result<()> {
    let result = Product::delete_by_id(product_id).exec(db).await?;

    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id: product_id });
    }

    info!(product_id, "Deleted product");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Test empty name validation
        let result = create_product(&db, widget_fields_named("")).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ref errors)) if errors.for_field("ProductName").count() == 1
        ));

        // Test whitespace-only name validation
        let result = create_product(&db, widget_fields_named("   ")).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        // Test negative price validation
        let mut fields = widget_fields();
        fields.price = -10.0;
        let result = create_product(&db, fields).await;
        assert!(matches!(
            result,
            Err(Error::Validation(ref errors))
                if errors.for_field("Price").eq(["Price cannot be negative."])
        ));

        // Test NaN price validation
        let mut fields = widget_fields();
        fields.price = f64::NAN;
        let result = create_product(&db, fields).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_product(&db, widget_fields()).await?;

        assert!(product.product_id > 0);
        assert_eq!(product.product_name, "Widget");
        assert_eq!(product.product_description.as_deref(), Some("A widget"));
        assert_eq!(product.price, 9.99);
        assert_eq!(product.product_type, ProductType::Tool);

        let all = get_all_products(&db).await?;
        assert_eq!(all, vec![product]);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_product(&db, "First").await?;
        let second = create_test_product(&db, "Second").await?;

        assert_ne!(first.product_id, second.product_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_description_is_stored_as_none() -> Result<()> {
        let db = setup_test_db().await?;

        let mut fields = widget_fields();
        fields.product_description = Some("   ".to_string());
        let product = create_product(&db, fields).await?;

        assert_eq!(product.product_description, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_by_id_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Test Product").await?;

        let found = get_product_by_id(&db, product.product_id).await?;
        assert_eq!(found, Some(product));

        let not_found = get_product_by_id(&db, 999).await?;
        assert!(not_found.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Original Name").await?;

        let updated = update_product(
            &db,
            product.product_id,
            ProductFields {
                product_name: "Updated Name".to_string(),
                product_description: None,
                price: 15.0,
                product_type: ProductType::Supply,
            },
        )
        .await?;

        assert_eq!(updated.product_id, product.product_id);
        assert_eq!(updated.product_name, "Updated Name");
        assert_eq!(updated.price, 15.0);
        assert_eq!(updated.product_type, ProductType::Supply);
        assert_eq!(updated.row_version, product.row_version + 1);

        // Verify the update persisted
        let retrieved = get_product_by_id(&db, product.product_id).await?.unwrap();
        assert_eq!(retrieved, updated);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_product(&db, 42, widget_fields()).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 42 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_invalid_fields_leaves_row_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Keep Me").await?;

        let result = update_product(&db, product.product_id, widget_fields_named("")).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let retrieved = get_product_by_id(&db, product.product_id).await?.unwrap();
        assert_eq!(retrieved, product);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_with_stale_version_is_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let read = create_test_product(&db, "Contended").await?;

        // Another request saves first, moving the row past the version we read.
        let winner = update_product(&db, read.product_id, widget_fields_named("Winner")).await?;

        let result = save_if_unchanged(&db, &read, widget_fields_named("Loser")).await;
        assert!(matches!(
            result,
            Err(Error::ConcurrencyConflict { id }) if id == read.product_id
        ));

        // The first writer's values survive
        let retrieved = get_product_by_id(&db, read.product_id).await?.unwrap();
        assert_eq!(retrieved, winner);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_of_row_deleted_mid_edit_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let read = create_test_product(&db, "Vanishing").await?;

        delete_product(&db, read.product_id).await?;

        let result = save_if_unchanged(&db, &read, widget_fields()).await;
        assert!(matches!(
            result,
            Err(Error::ProductNotFound { id }) if id == read.product_id
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_removes_only_that_row() -> Result<()> {
        let db = setup_test_db().await?;
        let keep_a = create_test_product(&db, "Keep A").await?;
        let doomed = create_test_product(&db, "Doomed").await?;
        let keep_b = create_test_product(&db, "Keep B").await?;

        delete_product(&db, doomed.product_id).await?;

        let mut remaining: Vec<i32> = get_all_products(&db)
            .await?
            .into_iter()
            .map(|p| p.product_id)
            .collect();
        remaining.sort_unstable();
        assert_eq!(remaining, vec![keep_a.product_id, keep_b.product_id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = delete_product(&db, 999).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_product_exists() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Here").await?;

        assert!(product_exists(&db, product.product_id).await?);
        assert!(!product_exists(&db, product.product_id + 1).await?);

        Ok(())
    }

    #[test]
    fn test_product_type_parse() {
        assert_eq!(ProductType::parse("Tool"), Some(ProductType::Tool));
        assert_eq!(ProductType::parse(" accessory "), Some(ProductType::Accessory));
        assert_eq!(ProductType::parse("Gadget"), None);
    }
}
