//! # Checkout
//!
//! The billing flow: catalog snapshot, composition, persistence.
//!
//! ```text
//!  selection + customer ──► compose(snapshot, draw()) ──► create_fresh ──► Composition
//!                                 │                              │
//!                                 └─ ValidationError             └─ StoreError
//!                                    (nothing persisted)
//! ```

use std::sync::Arc;

use billdesk_core::{compose, generate_bill_number, Composition, Selection, TaxTable};
use tracing::{info, warn};

use super::{BillLedger, CatalogService};
use crate::error::AppResult;

pub struct Checkout {
    catalog: Arc<CatalogService>,
    ledger: BillLedger,
    taxes: TaxTable,
}

impl Checkout {
    pub fn new(catalog: Arc<CatalogService>, ledger: BillLedger, taxes: TaxTable) -> Self {
        Checkout {
            catalog,
            ledger,
            taxes,
        }
    }

    pub fn taxes(&self) -> &TaxTable {
        &self.taxes
    }

    pub fn ledger(&self) -> &BillLedger {
        &self.ledger
    }

    /// Composes a bill under a fresh number and stores it.
    ///
    /// The returned composition holds the bill as stored, which may carry a
    /// redrawn number if the first draw collided.
    pub async fn checkout(
        &self,
        selection: &Selection,
        customer_name: &str,
        customer_phone: &str,
    ) -> AppResult<Composition> {
        let snapshot = self.catalog.snapshot().await?;
        let Composition { bill, dropped } = compose(
            selection,
            &snapshot,
            customer_name,
            customer_phone,
            generate_bill_number(),
            &self.taxes,
        )?;
        report_dropped(&dropped);

        let bill = self.ledger.create_fresh(bill).await?;
        info!(bill_no = %bill.bill_no(), items = bill.items().len(), "Checkout complete");
        Ok(Composition { bill, dropped })
    }

    /// Composes a bill under an existing number and replaces whatever is
    /// stored there.
    pub async fn recompose(
        &self,
        bill_no: &str,
        selection: &Selection,
        customer_name: &str,
        customer_phone: &str,
    ) -> AppResult<Composition> {
        let snapshot = self.catalog.snapshot().await?;
        let composition = compose(
            selection,
            &snapshot,
            customer_name,
            customer_phone,
            bill_no,
            &self.taxes,
        )?;
        report_dropped(&composition.dropped);

        self.ledger.create(&composition.bill).await?;
        info!(bill_no = %bill_no, "Bill recomposed");
        Ok(composition)
    }
}

fn report_dropped(dropped: &[String]) {
    if !dropped.is_empty() {
        warn!(?dropped, "Selected products are no longer in the catalog");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use billdesk_core::{Category, Money, Product};
    use billdesk_db::{MemoryCatalog, MemoryLedger};

    use crate::error::ErrorCode;

    fn checkout() -> (Arc<MemoryCatalog>, Arc<MemoryLedger>, Checkout) {
        let timeout = Duration::from_secs(1);
        let catalog_store = Arc::new(MemoryCatalog::new(vec![
            Product::new("A", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("B", "Rice", Money::from_major(35), Category::Grocery),
        ]));
        let ledger_store = Arc::new(MemoryLedger::new());
        let checkout = Checkout::new(
            Arc::new(CatalogService::new(catalog_store.clone(), timeout)),
            BillLedger::new(ledger_store.clone(), timeout),
            TaxTable::default(),
        );
        (catalog_store, ledger_store, checkout)
    }

    #[tokio::test]
    async fn test_checkout_persists_bill() {
        let (_, store, checkout) = checkout();
        let selection = Selection::new().add("A", 2).add("B", 1);

        let composition = checkout.checkout(&selection, "Ravi", "98765").await.unwrap();
        let bill = &composition.bill;
        assert_eq!(bill.total_amount(), Money::from_minor(7735));
        assert_eq!(bill.bill_no().len(), 5);
        assert!(composition.dropped.is_empty());

        let stored = checkout.ledger().get(bill.bill_no()).await.unwrap();
        assert_eq!(stored.as_ref(), Some(bill));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_checkout_persists_nothing() {
        let (_, store, checkout) = checkout();

        let err = checkout
            .checkout(&Selection::new().add("A", 0), "Ravi", "98765")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = checkout
            .checkout(&Selection::new().add("A", 1), "  ", "98765")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropped_products_are_reported() {
        let (_, _, checkout) = checkout();
        let selection = Selection::new().add("A", 1).add("GONE", 3);

        let composition = checkout.checkout(&selection, "Ravi", "98765").await.unwrap();
        assert_eq!(composition.dropped, vec!["GONE".to_string()]);
        assert_eq!(composition.bill.items().len(), 1);
    }

    #[tokio::test]
    async fn test_recompose_replaces_existing_bill() {
        let (_, store, checkout) = checkout();
        checkout
            .recompose("10001", &Selection::new().add("A", 1), "Ravi", "98765")
            .await
            .unwrap();
        checkout
            .recompose("10001", &Selection::new().add("B", 2), "Ravi", "98765")
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let bill = checkout.ledger().get("10001").await.unwrap().unwrap();
        assert_eq!(bill.items()[0].product_id(), "B");
    }
}
