//! # Catalog Repository
//!
//! SQLite-backed product catalog.
//!
//! Rows whose `category` no longer parses are skipped with a warning rather
//! than failing the whole listing; a bad row must not lock the shop out of
//! billing.

use async_trait::async_trait;
use billdesk_core::validation::validate_price_minor;
use billdesk_core::{Category, Money, Product, ValidationError};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::CatalogStore;

/// Raw `products` row.
#[derive(Debug, FromRow)]
struct ProductRow {
    product_id: String,
    name: String,
    price_minor: i64,
    category: String,
}

impl ProductRow {
    fn into_product(self) -> Option<Product> {
        match self.category.parse::<Category>() {
            Ok(category) => Some(Product {
                product_id: self.product_id,
                name: self.name,
                unit_price: Money::from_minor(self.price_minor),
                category,
            }),
            Err(err) => {
                warn!(product_id = %self.product_id, error = %err, "Skipping product row");
                None
            }
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Creates a new SqliteCatalog.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCatalog { pool }
    }

    /// Inserts or replaces a product (seeding and catalog maintenance).
    ///
    /// A blank id or a negative price is refused with
    /// `StoreError::Validation`.
    pub async fn save(&self, product: &Product) -> StoreResult<()> {
        if product.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            }
            .into());
        }
        validate_price_minor(product.unit_price.minor())?;

        debug!(product_id = %product.product_id, "Saving product");

        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, price_minor, category)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(product_id) DO UPDATE SET
                name = excluded.name,
                price_minor = excluded.price_minor,
                category = excluded.category
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(product.unit_price.minor())
        .bind(product.category.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of products in the catalog.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT product_id, name, price_minor, category FROM products ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let products: Vec<Product> = rows.into_iter().filter_map(ProductRow::into_product).collect();
        debug!(count = products.len(), "Listed catalog");
        Ok(products)
    }

    async fn list_by_category(&self, category: Category) -> StoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT product_id, name, price_minor, category
            FROM products
            WHERE category = ?1
            ORDER BY rowid
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        let products: Vec<Product> = rows.into_iter().filter_map(ProductRow::into_product).collect();
        debug!(category = %category, count = products.len(), "Listed category");
        Ok(products)
    }

    async fn get(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT product_id, name, price_minor, category FROM products WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(ProductRow::into_product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};

    async fn catalog() -> SqliteCatalog {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let catalog = catalog().await;
        catalog
            .save(&Product::new("med_1", "Sanitizer", Money::from_major(20), Category::Medical))
            .await
            .unwrap();
        catalog
            .save(&Product::new("gro_1", "Rice", Money::from_major(35), Category::Grocery))
            .await
            .unwrap();

        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].product_id, "med_1");

        let grocery = catalog.list_by_category(Category::Grocery).await.unwrap();
        assert_eq!(grocery.len(), 1);
        assert_eq!(grocery[0].unit_price, Money::from_minor(3500));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let catalog = catalog().await;
        assert!(catalog.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces() {
        let catalog = catalog().await;
        let mut product = Product::new("drk_4", "Coke", Money::from_major(20), Category::Drinks);
        catalog.save(&product).await.unwrap();
        product.unit_price = Money::from_major(25);
        catalog.save(&product).await.unwrap();

        assert_eq!(catalog.count().await.unwrap(), 1);
        let stored = catalog.get("drk_4").await.unwrap().unwrap();
        assert_eq!(stored.unit_price, Money::from_major(25));
    }

    #[tokio::test]
    async fn test_save_refuses_negative_price() {
        let catalog = catalog().await;
        let result = catalog
            .save(&Product::new("gro_9", "Refund", Money::from_minor(-100), Category::Grocery))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::OutOfRange { field, .. })) if field == "price"
        ));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_category_rows_are_skipped() {
        let catalog = catalog().await;
        catalog
            .save(&Product::new("med_1", "Mask", Money::from_major(10), Category::Medical))
            .await
            .unwrap();
        sqlx::query("INSERT INTO products VALUES ('toy_1', 'Yo-yo', 500, 'toys')")
            .execute(&catalog.pool)
            .await
            .unwrap();

        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(catalog.get("toy_1").await.unwrap().is_none());
    }
}
