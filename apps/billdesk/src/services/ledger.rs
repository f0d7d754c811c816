//! # Bill Lifecycle Manager
//!
//! Create, read, update, delete and search bills over an injected
//! [`LedgerStore`].
//!
//! ## Lifecycle
//! ```text
//!   compose()            create / create_fresh        update (patch)
//! ┌──────────┐  save   ┌─────────────┐  patch   ┌─────────────┐
//! │ Composed │ ──────► │  Persisted  │ ───────► │   Updated   │ ─┐
//! │ (memory) │         └──────┬──────┘ ◄─────── └──────┬──────┘  │ patch
//! └──────────┘                │  delete                │ delete  ◄┘
//!                             ▼                        ▼
//!                      ┌─────────────────────────────────────┐
//!                      │  Deleted (number free for reuse)    │
//!                      └─────────────────────────────────────┘
//! ```
//!
//! There is no locked or audited state: a persisted bill can always be
//! replaced or deleted.
//!
//! ## Bill Numbers
//! `create` writes under whatever number the bill carries and replaces an
//! existing bill with that number. `create_fresh` checks the ledger first
//! and redraws on a collision, giving up after `max_attempts` draws.

use std::sync::Arc;
use std::time::Duration;

use billdesk_core::{generate_bill_number, Bill, BillField, BillPatch};
use billdesk_db::{LedgerStore, StoreError, StoreResult};
use tracing::{debug, info, warn};

use super::with_timeout;
use crate::error::AppResult;

/// Default number of bill number draws before `create_fresh` gives up.
pub const DEFAULT_BILL_NUMBER_ATTEMPTS: u32 = 5;

/// The bill lifecycle manager.
#[derive(Clone)]
pub struct BillLedger {
    store: Arc<dyn LedgerStore>,
    timeout: Duration,
    max_attempts: u32,
}

impl BillLedger {
    pub fn new(store: Arc<dyn LedgerStore>, timeout: Duration) -> Self {
        BillLedger {
            store,
            timeout,
            max_attempts: DEFAULT_BILL_NUMBER_ATTEMPTS,
        }
    }

    /// Sets how many bill numbers `create_fresh` tries.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Writes the bill under its number, replacing any bill already there.
    pub async fn create(&self, bill: &Bill) -> StoreResult<String> {
        let bill_no =
            with_timeout("ledger.save", self.timeout, self.store.save(bill)).await?;
        info!(bill_no = %bill_no, total = %bill.total_amount(), "Bill saved");
        Ok(bill_no)
    }

    /// Writes the bill under a number no stored bill uses.
    ///
    /// The bill's own number is tried first, then fresh draws. Returns the
    /// bill as stored (possibly renumbered).
    pub async fn create_fresh(&self, bill: Bill) -> StoreResult<Bill> {
        self.create_fresh_with(bill, generate_bill_number).await
    }

    /// [`BillLedger::create_fresh`] with a caller-supplied number source.
    pub async fn create_fresh_with<F>(&self, bill: Bill, mut draw: F) -> StoreResult<Bill>
    where
        F: FnMut() -> String,
    {
        let mut candidate = bill.bill_no().to_string();

        for attempt in 1..=self.max_attempts {
            if self.get(&candidate).await?.is_none() {
                let bill = bill.with_bill_no(candidate);
                self.create(&bill).await?;
                return Ok(bill);
            }
            warn!(bill_no = %candidate, attempt, "Bill number already used, redrawing");
            candidate = draw();
        }

        Err(StoreError::BillNumberExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Point lookup. `None` when no bill has that number.
    pub async fn get(&self, bill_no: &str) -> StoreResult<Option<Bill>> {
        with_timeout("ledger.get", self.timeout, self.store.get(bill_no)).await
    }

    /// Applies a patch of customer contact fields.
    ///
    /// ## Errors
    /// - `ValidationError::NoUpdateFields` for an empty patch
    /// - `ValidationError::Required` for a blank field in the patch
    ///
    /// Values are stored trimmed, as composition stores them. Returns `false`
    /// when the bill does not exist. Totals are never touched.
    pub async fn update(&self, bill_no: &str, patch: &BillPatch) -> AppResult<bool> {
        patch.validate()?;
        let patch = patch.trimmed();

        let updated =
            with_timeout("ledger.update", self.timeout, self.store.update(bill_no, &patch))
                .await?;
        debug!(bill_no = %bill_no, updated, "Bill update");
        Ok(updated)
    }

    /// Removes a bill. Deleting a missing bill succeeds.
    pub async fn delete(&self, bill_no: &str) -> StoreResult<bool> {
        let deleted =
            with_timeout("ledger.delete", self.timeout, self.store.delete(bill_no)).await?;
        info!(bill_no = %bill_no, "Bill deleted");
        Ok(deleted)
    }

    /// Bills whose `field` equals `value`, in no particular order.
    pub async fn search(&self, field: BillField, value: &str) -> StoreResult<Vec<Bill>> {
        with_timeout("ledger.find", self.timeout, self.store.find(field, value)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use billdesk_core::{compose, Category, Money, Product, Selection, TaxTable, ValidationError};
    use billdesk_db::MemoryLedger;

    use crate::error::ErrorCode;

    fn bill(bill_no: &str) -> Bill {
        let catalog = vec![
            Product::new("A", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("B", "Rice", Money::from_major(35), Category::Grocery),
        ];
        let selection = Selection::new().add("A", 2).add("B", 1);
        compose(&selection, &catalog, "Ravi", "98765", bill_no, &TaxTable::default())
            .unwrap()
            .bill
    }

    fn ledger() -> (Arc<MemoryLedger>, BillLedger) {
        let store = Arc::new(MemoryLedger::new());
        let ledger = BillLedger::new(store.clone(), Duration::from_secs(1));
        (store, ledger)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (_, ledger) = ledger();
        let original = bill("10001");
        assert_eq!(ledger.create(&original).await.unwrap(), "10001");
        assert_eq!(ledger.get("10001").await.unwrap(), Some(original));
        assert_eq!(ledger.get("10002").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_overwrites() {
        let (store, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();
        ledger.create(&bill("10001")).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_fresh_keeps_free_number() {
        let (_, ledger) = ledger();
        let stored = ledger
            .create_fresh_with(bill("10001"), || panic!("no redraw expected"))
            .await
            .unwrap();
        assert_eq!(stored.bill_no(), "10001");
    }

    #[tokio::test]
    async fn test_create_fresh_redraws_on_collision() {
        let (store, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();

        let mut draws = vec!["10001".to_string(), "10002".to_string()].into_iter();
        let stored = ledger
            .create_fresh_with(bill("10001"), || draws.next().unwrap())
            .await
            .unwrap();

        assert_eq!(stored.bill_no(), "10002");
        assert_eq!(store.len().await, 2);
        assert_eq!(ledger.get("10001").await.unwrap().unwrap().customer_name(), "Ravi");
    }

    #[tokio::test]
    async fn test_create_fresh_gives_up() {
        let (_, ledger) = ledger();
        let ledger = ledger.max_attempts(3);
        ledger.create(&bill("10001")).await.unwrap();

        let err = ledger
            .create_fresh_with(bill("10001"), || "10001".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::BillNumberExhausted { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_update_with_empty_patch_fails() {
        let (_, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();

        let err = ledger.update("10001", &BillPatch::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, ValidationError::NoUpdateFields.to_string());
    }

    #[tokio::test]
    async fn test_update_patches_and_reports_missing() {
        let (_, ledger) = ledger();
        let original = bill("10001");
        ledger.create(&original).await.unwrap();

        let patch = BillPatch {
            customer_name: Some("Ravi Kumar".to_string()),
            customer_phone: None,
        };
        assert!(ledger.update("10001", &patch).await.unwrap());
        assert!(!ledger.update("20002", &patch).await.unwrap());

        let stored = ledger.get("10001").await.unwrap().unwrap();
        assert_eq!(stored.customer_name(), "Ravi Kumar");
        assert_eq!(stored.total_amount(), original.total_amount());
    }

    #[tokio::test]
    async fn test_updated_name_is_searchable_trimmed() {
        let (_, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();

        let patch = BillPatch {
            customer_name: Some(" Meera ".to_string()),
            customer_phone: Some(" 12345 ".to_string()),
        };
        assert!(ledger.update("10001", &patch).await.unwrap());

        let by_name = ledger.search(BillField::CustomerName, "Meera").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].customer_name(), "Meera");
        assert_eq!(ledger.search(BillField::CustomerPhone, "12345").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let (_, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();
        assert!(ledger.delete("10001").await.unwrap());
        assert!(ledger.delete("10001").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_empty_is_not_an_error() {
        let (_, ledger) = ledger();
        ledger.create(&bill("10001")).await.unwrap();
        assert_eq!(ledger.search(BillField::CustomerPhone, "98765").await.unwrap().len(), 1);
        assert!(ledger.search(BillField::CustomerName, "Nobody").await.unwrap().is_empty());
    }

    /// A ledger that never answers.
    struct StalledLedger;

    #[async_trait]
    impl LedgerStore for StalledLedger {
        async fn save(&self, _: &Bill) -> StoreResult<String> {
            std::future::pending().await
        }
        async fn get(&self, _: &str) -> StoreResult<Option<Bill>> {
            std::future::pending().await
        }
        async fn update(&self, _: &str, _: &BillPatch) -> StoreResult<bool> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> StoreResult<bool> {
            std::future::pending().await
        }
        async fn find(&self, _: BillField, _: &str) -> StoreResult<Vec<Bill>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let ledger = BillLedger::new(Arc::new(StalledLedger), Duration::from_millis(20));

        assert!(matches!(
            ledger.get("10001").await,
            Err(StoreError::Timeout { operation, .. }) if operation == "ledger.get"
        ));
        assert!(matches!(
            ledger.create(&bill("10001")).await,
            Err(StoreError::Timeout { .. })
        ));

        let patch = BillPatch {
            customer_name: Some("X".to_string()),
            customer_phone: None,
        };
        let err = ledger.update("10001", &patch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
    }
}
