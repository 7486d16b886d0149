//! Catalog domain types.
//!
//! Products and categories are owned by the backend catalog; the store only
//! holds cached copies, replaced wholesale on each successful fetch.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jersey_shop_core::{CategoryId, ProductId};

/// A purchasable product from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price. Non-negative.
    pub price: Decimal,
    /// Image reference (URL or asset path).
    pub image: String,
    /// Category name this product belongs to.
    pub category: String,
    /// Units in stock.
    pub stock: i32,
    /// Average review rating, if any reviews exist.
    #[serde(default)]
    pub rating: Option<f32>,
    /// Number of reviews.
    #[serde(default)]
    pub reviews: Option<i32>,
    /// Available size variants (empty for one-size products).
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Image reference.
    pub image: String,
}
