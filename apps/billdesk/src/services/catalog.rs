//! # Catalog Service
//!
//! Read-mostly access to the product catalog.
//!
//! The first call fetches the whole catalog and keeps it as a snapshot.
//! Later calls serve the snapshot until `refresh` is called. A product edited
//! in the store after the snapshot was taken is not seen until then; bills
//! freeze prices at composition anyway.

use std::sync::Arc;
use std::time::Duration;

use billdesk_core::{Category, Product};
use billdesk_db::{CatalogStore, StoreResult};
use tokio::sync::RwLock;
use tracing::debug;

use super::with_timeout;

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
    snapshot: RwLock<Option<Arc<Vec<Product>>>>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        CatalogService {
            store,
            timeout,
            snapshot: RwLock::new(None),
        }
    }

    /// The cached catalog, fetched on first use.
    pub async fn snapshot(&self) -> StoreResult<Arc<Vec<Product>>> {
        if let Some(products) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(products));
        }
        self.refresh().await
    }

    /// Refetches the catalog and replaces the cached snapshot.
    pub async fn refresh(&self) -> StoreResult<Arc<Vec<Product>>> {
        let products = Arc::new(
            with_timeout("catalog.list_all", self.timeout, self.store.list_all()).await?,
        );
        debug!(count = products.len(), "Catalog snapshot refreshed");
        *self.snapshot.write().await = Some(Arc::clone(&products));
        Ok(products)
    }

    /// Products of one category, in catalog order. Served from the snapshot.
    pub async fn by_category(&self, category: Category) -> StoreResult<Vec<Product>> {
        Ok(self
            .snapshot()
            .await?
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    /// Point lookup against the store, bypassing the snapshot.
    pub async fn get(&self, product_id: &str) -> StoreResult<Option<Product>> {
        with_timeout("catalog.get", self.timeout, self.store.get(product_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::Money;
    use billdesk_db::MemoryCatalog;

    fn store() -> Arc<MemoryCatalog> {
        Arc::new(MemoryCatalog::new(vec![
            Product::new("med_1", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("gro_1", "Rice", Money::from_major(35), Category::Grocery),
            Product::new("med_2", "Bandage", Money::from_major(15), Category::Medical),
        ]))
    }

    #[tokio::test]
    async fn test_by_category_keeps_catalog_order() {
        let service = CatalogService::new(store(), Duration::from_secs(1));
        let medical = service.by_category(Category::Medical).await.unwrap();
        let ids: Vec<_> = medical.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, ["med_1", "med_2"]);
        assert!(service.by_category(Category::Drinks).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_stale_until_refresh() {
        let store = store();
        let service = CatalogService::new(store.clone(), Duration::from_secs(1));
        assert_eq!(service.snapshot().await.unwrap().len(), 3);

        store.remove("gro_1").await;
        assert_eq!(service.snapshot().await.unwrap().len(), 3);
        assert!(service.get("gro_1").await.unwrap().is_none());

        assert_eq!(service.refresh().await.unwrap().len(), 2);
        assert_eq!(service.snapshot().await.unwrap().len(), 2);
    }
}
