//! Product entity - The single catalog record managed by administrators.
//!
//! Every column except `product_id` and `row_version` is editable through the
//! create/edit forms. `row_version` is bumped on each successful edit and guards
//! the update statement against concurrent writers.

use sea_orm::{Iterable, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Category a product is filed under.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ProductType {
    /// Hand and power tools
    #[sea_orm(string_value = "Tool")]
    Tool,
    /// Replacement parts and components
    #[sea_orm(string_value = "Part")]
    Part,
    /// Consumable supplies
    #[sea_orm(string_value = "Supply")]
    Supply,
    /// Accessories and add-ons
    #[sea_orm(string_value = "Accessory")]
    Accessory,
    /// Anything that fits no other category
    #[sea_orm(string_value = "Other")]
    Other,
}

impl ProductType {
    /// Name used in forms and the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "Tool",
            Self::Part => "Part",
            Self::Supply => "Supply",
            Self::Accessory => "Accessory",
            Self::Other => "Other",
        }
    }

    /// Parses a posted category name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::iter().find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Store-generated identifier, never changed after insert
    #[sea_orm(primary_key)]
    pub product_id: i32,
    /// Display name (e.g., "Widget")
    pub product_name: String,
    /// Optional free-text description
    pub product_description: Option<String>,
    /// Unit price in dollars
    pub price: f64,
    /// Catalog category
    pub product_type: ProductType,
    /// Optimistic concurrency counter
    pub row_version: i32,
}

/// Products have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
