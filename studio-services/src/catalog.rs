//! Product rows as stored in the catalog.

use serde::{Deserialize, Serialize};

/// A stored product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Row id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Selling price.
    pub price: f64,
    /// Price before discount, if any.
    #[serde(default)]
    pub original_price: Option<f64>,
    /// Listing description.
    #[serde(default)]
    pub description: String,
    /// Primary image URL.
    pub image_url: String,
    /// Additional image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Units in stock.
    #[serde(default)]
    pub stock: i64,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Average rating.
    #[serde(default)]
    pub rating: f64,
    /// Number of reviews.
    #[serde(default)]
    pub reviews: i64,
    /// Creation timestamp as returned by the store.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A product to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Selling price.
    pub price: f64,
    /// Listing description.
    pub description: String,
    /// Primary image URL.
    pub image_url: String,
    /// Category label.
    pub category: String,
    /// Units in stock.
    pub stock: i64,
    /// Initial rating.
    pub rating: f64,
    /// Initial review count.
    pub reviews: i64,
}
