//! # Default Catalog
//!
//! The eighteen products a fresh shop starts with, six per category.

use billdesk_core::{Category, Money, Product};
use tracing::info;

use crate::error::StoreResult;
use crate::repository::SqliteCatalog;

/// `(product_id, name, price in rupees, category)`
const DEFAULT_PRODUCTS: &[(&str, &str, i64, Category)] = &[
    ("med_1", "Sanitizer", 20, Category::Medical),
    ("med_2", "Mask", 10, Category::Medical),
    ("med_3", "Hand Gloves", 70, Category::Medical),
    ("med_4", "Syrup", 30, Category::Medical),
    ("med_5", "Cream", 20, Category::Medical),
    ("med_6", "Thermal Gun", 20, Category::Medical),
    ("gro_1", "Rice", 35, Category::Grocery),
    ("gro_2", "Food Oil", 120, Category::Grocery),
    ("gro_3", "Wheat", 26, Category::Grocery),
    ("gro_4", "Spices", 10, Category::Grocery),
    ("gro_5", "Flour", 30, Category::Grocery),
    ("gro_6", "Maggi", 25, Category::Grocery),
    ("drk_1", "Sprite", 95, Category::Drinks),
    ("drk_2", "Mineral Water", 20, Category::Drinks),
    ("drk_3", "Juice", 10, Category::Drinks),
    ("drk_4", "Coke", 20, Category::Drinks),
    ("drk_5", "Lassi", 30, Category::Drinks),
    ("drk_6", "Mountain Duo", 100, Category::Drinks),
];

/// The default catalog as products.
pub fn default_catalog() -> Vec<Product> {
    DEFAULT_PRODUCTS
        .iter()
        .map(|(id, name, rupees, category)| {
            Product::new(*id, *name, Money::from_major(*rupees), *category)
        })
        .collect()
}

/// Writes the default catalog, replacing products with the same ids.
///
/// Returns the number of products written.
pub async fn seed_default_catalog(catalog: &SqliteCatalog) -> StoreResult<usize> {
    let products = default_catalog();
    for product in &products {
        catalog.save(product).await?;
    }
    info!(count = products.len(), "Seeded default catalog");
    Ok(products.len())
}
