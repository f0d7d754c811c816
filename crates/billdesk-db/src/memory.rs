//! # In-Memory Stores
//!
//! Store implementations backed by process memory. Used by tests and by
//! anything that wants a throwaway ledger without a database file.
//!
//! They follow the same contracts as the SQLite repositories: `save` is an
//! upsert, `delete` is idempotent, lookups return `Option`.

use std::collections::HashMap;

use async_trait::async_trait;
use billdesk_core::{Bill, BillField, BillPatch, Category, Product, UserPatch};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::{CatalogStore, LedgerStore, UserRecord, UserStore};

// =============================================================================
// Catalog
// =============================================================================

/// Product catalog held in a vector (catalog order = insertion order).
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        MemoryCatalog {
            products: RwLock::new(products),
        }
    }

    /// Inserts or replaces a product.
    pub async fn save(&self, product: Product) {
        let mut products = self.products.write().await;
        match products
            .iter_mut()
            .find(|p| p.product_id == product.product_id)
        {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }

    /// Removes a product (simulates a catalog edit between fetch and bill).
    pub async fn remove(&self, product_id: &str) {
        self.products
            .write()
            .await
            .retain(|p| p.product_id != product_id);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn list_by_category(&self, category: Category) -> StoreResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn get(&self, product_id: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned())
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Bill ledger keyed by bill number.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    bills: RwLock<HashMap<String, Bill>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger::default()
    }

    pub async fn len(&self) -> usize {
        self.bills.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bills.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn save(&self, bill: &Bill) -> StoreResult<String> {
        debug!(bill_no = %bill.bill_no(), "Saving bill (memory)");
        self.bills
            .write()
            .await
            .insert(bill.bill_no().to_string(), bill.clone());
        Ok(bill.bill_no().to_string())
    }

    async fn get(&self, bill_no: &str) -> StoreResult<Option<Bill>> {
        Ok(self.bills.read().await.get(bill_no).cloned())
    }

    async fn update(&self, bill_no: &str, patch: &BillPatch) -> StoreResult<bool> {
        let mut bills = self.bills.write().await;
        match bills.get_mut(bill_no) {
            Some(bill) => {
                *bill = bill.apply_patch(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, bill_no: &str) -> StoreResult<bool> {
        self.bills.write().await.remove(bill_no);
        Ok(true)
    }

    async fn find(&self, field: BillField, value: &str) -> StoreResult<Vec<Bill>> {
        Ok(self
            .bills
            .read()
            .await
            .values()
            .filter(|b| b.field(field) == value)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Users
// =============================================================================

/// User accounts keyed by uid.
#[derive(Debug, Default)]
pub struct MemoryUsers {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        MemoryUsers::default()
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn save(&self, record: &UserRecord) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let email = record.user.email.to_lowercase();
        if users
            .values()
            .any(|r| r.user.email == email && r.user.uid != record.user.uid)
        {
            return Err(StoreError::duplicate("email", &record.user.email));
        }
        let mut stored = record.clone();
        stored.user.email = email;
        users.insert(stored.user.uid.clone(), stored);
        Ok(())
    }

    async fn get_by_id(&self, uid: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|r| r.user.email == email)
            .cloned())
    }

    async fn get_by_verification_token(&self, token: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|r| r.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_email_verified(&self, uid: &str, verified: bool) -> StoreResult<bool> {
        Ok(match self.users.write().await.get_mut(uid) {
            Some(record) => {
                record.user.is_email_verified = verified;
                true
            }
            None => false,
        })
    }

    async fn set_verification_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool> {
        Ok(match self.users.write().await.get_mut(uid) {
            Some(record) => {
                record.verification_token = token.map(str::to_string);
                true
            }
            None => false,
        })
    }

    async fn get_by_reset_token(&self, token: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|r| r.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn set_reset_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool> {
        Ok(match self.users.write().await.get_mut(uid) {
            Some(record) => {
                record.reset_token = token.map(str::to_string);
                true
            }
            None => false,
        })
    }

    async fn set_password_hash(&self, uid: &str, password_hash: &str) -> StoreResult<bool> {
        Ok(match self.users.write().await.get_mut(uid) {
            Some(record) => {
                record.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn update_profile(&self, uid: &str, patch: &UserPatch) -> StoreResult<bool> {
        Ok(match self.users.write().await.get_mut(uid) {
            Some(record) => {
                patch.apply(&mut record.user);
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::{compose, Money, Selection, TaxTable};

    fn products() -> Vec<Product> {
        vec![
            Product::new("med_1", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("drk_1", "Sprite", Money::from_major(95), Category::Drinks),
        ]
    }

    #[tokio::test]
    async fn test_catalog_by_category() {
        let catalog = MemoryCatalog::new(products());
        let drinks = catalog.list_by_category(Category::Drinks).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].name, "Sprite");

        catalog.remove("drk_1").await;
        assert!(catalog.get("drk_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ledger_contract() {
        let ledger = MemoryLedger::new();
        let selection = Selection::new().add("med_1", 1);
        let bill = compose(&selection, &products(), "Ravi", "1", "20001", &TaxTable::default())
            .unwrap()
            .bill;

        ledger.save(&bill).await.unwrap();
        assert_eq!(ledger.get("20001").await.unwrap(), Some(bill));

        let patch = BillPatch {
            customer_name: Some("Ravi K".to_string()),
            ..BillPatch::default()
        };
        assert!(ledger.update("20001", &patch).await.unwrap());
        assert!(!ledger.update("20002", &patch).await.unwrap());
        assert_eq!(
            ledger.find(BillField::CustomerName, "Ravi K").await.unwrap().len(),
            1
        );

        assert!(ledger.delete("20001").await.unwrap());
        assert!(ledger.delete("20001").await.unwrap());
        assert!(ledger.is_empty().await);
    }
}
