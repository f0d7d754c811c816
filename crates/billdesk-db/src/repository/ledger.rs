//! # Ledger Repository
//!
//! SQLite-backed bill ledger.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bills                                                                  │
//! │  ┌─────────┬───────────────┬────────────────┬─────────┬──────────────┐ │
//! │  │ bill_no │ customer_name │ customer_phone │ total   │ document     │ │
//! │  ├─────────┼───────────────┼────────────────┼─────────┼──────────────┤ │
//! │  │ 48213   │ Ravi          │ 98765          │ 7735    │ {BillRecord} │ │
//! │  └─────────┴───────────────┴────────────────┴─────────┴──────────────┘ │
//! │       ▲              ▲               ▲                       ▲          │
//! │       └── key        └─── searchable columns ──┘             │          │
//! │                                                    decoded on read     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `save` is an upsert (last writer wins). `update` reads, patches and
//! writes back inside one transaction.

use async_trait::async_trait;
use billdesk_core::{to_record, Bill, BillField, BillPatch, BillRecord};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::LedgerStore;

/// Repository for bill documents.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Creates a new SqliteLedger.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedger { pool }
    }

    /// Number of bills in the ledger.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn upsert(tx: &mut Transaction<'_, Sqlite>, bill: &Bill) -> StoreResult<()> {
        let record = to_record(bill);
        let document = serde_json::to_string(&record)?;

        sqlx::query(
            r#"
            INSERT INTO bills (bill_no, customer_name, customer_phone,
                               total_amount_minor, created_at, document)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(bill_no) DO UPDATE SET
                customer_name = excluded.customer_name,
                customer_phone = excluded.customer_phone,
                total_amount_minor = excluded.total_amount_minor,
                created_at = excluded.created_at,
                document = excluded.document
            "#,
        )
        .bind(bill.bill_no())
        .bind(bill.customer_name())
        .bind(bill.customer_phone())
        .bind(bill.total_amount().minor())
        .bind(&record.timestamp)
        .bind(&document)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// Decodes a stored document back into a bill.
fn decode(bill_no: &str, document: &str) -> StoreResult<Bill> {
    let record: BillRecord = serde_json::from_str(document)
        .map_err(|e| StoreError::corrupt("bill", bill_no, e))?;
    Ok(Bill::try_from(record)?)
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn save(&self, bill: &Bill) -> StoreResult<String> {
        debug!(bill_no = %bill.bill_no(), total = %bill.total_amount(), "Saving bill");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;
        Self::upsert(&mut tx, bill).await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        Ok(bill.bill_no().to_string())
    }

    async fn get(&self, bill_no: &str) -> StoreResult<Option<Bill>> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM bills WHERE bill_no = ?1")
                .bind(bill_no)
                .fetch_optional(&self.pool)
                .await?;

        document.map(|doc| decode(bill_no, &doc)).transpose()
    }

    async fn update(&self, bill_no: &str, patch: &BillPatch) -> StoreResult<bool> {
        debug!(bill_no = %bill_no, "Updating bill");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM bills WHERE bill_no = ?1")
                .bind(bill_no)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(document) = document else {
            debug!(bill_no = %bill_no, "Bill not found for update");
            return Ok(false);
        };

        let patched = decode(bill_no, &document)?.apply_patch(patch);
        Self::upsert(&mut tx, &patched).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        Ok(true)
    }

    async fn delete(&self, bill_no: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE bill_no = ?1")
            .bind(bill_no)
            .execute(&self.pool)
            .await?;

        debug!(bill_no = %bill_no, removed = result.rows_affected(), "Deleted bill");
        Ok(true)
    }

    async fn find(&self, field: BillField, value: &str) -> StoreResult<Vec<Bill>> {
        // Column names come from the BillField enum, never from input.
        let sql = format!(
            "SELECT bill_no, document FROM bills WHERE {} = ?1",
            field.as_str()
        );

        let rows: Vec<(String, String)> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        let bills = rows
            .iter()
            .map(|(bill_no, doc)| decode(bill_no, doc))
            .collect::<StoreResult<Vec<Bill>>>()?;

        debug!(field = %field, count = bills.len(), "Searched bills");
        Ok(bills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use billdesk_core::{compose, Category, Money, Product, Selection, TaxTable};

    async fn ledger() -> SqliteLedger {
        Database::new(DbConfig::in_memory()).await.unwrap().ledger()
    }

    fn bill(bill_no: &str, name: &str, phone: &str) -> Bill {
        let catalog = vec![
            Product::new("A", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("B", "Rice", Money::from_major(35), Category::Grocery),
        ];
        let selection = Selection::new().add("A", 2).add("B", 1);
        compose(&selection, &catalog, name, phone, bill_no, &TaxTable::default())
            .unwrap()
            .bill
    }

    #[tokio::test]
    async fn test_save_then_get_round_trips() {
        let ledger = ledger().await;
        let original = bill("10001", "Ravi", "98765");

        let key = ledger.save(&original).await.unwrap();
        assert_eq!(key, "10001");

        let stored = ledger.get("10001").await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(stored.total_amount(), Money::from_minor(7735));
    }

    #[tokio::test]
    async fn test_save_overwrites_same_number() {
        let ledger = ledger().await;
        ledger.save(&bill("10001", "Ravi", "1")).await.unwrap();
        ledger.save(&bill("10001", "Meera", "2")).await.unwrap();

        assert_eq!(ledger.count().await.unwrap(), 1);
        let stored = ledger.get("10001").await.unwrap().unwrap();
        assert_eq!(stored.customer_name(), "Meera");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let ledger = ledger().await;
        assert!(ledger.get("99999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_patches_contact_fields_only() {
        let ledger = ledger().await;
        let original = bill("10002", "Ravi", "98765");
        ledger.save(&original).await.unwrap();

        let patch = BillPatch {
            customer_phone: Some("11111".to_string()),
            ..BillPatch::default()
        };
        assert!(ledger.update("10002", &patch).await.unwrap());

        let stored = ledger.get("10002").await.unwrap().unwrap();
        assert_eq!(stored.customer_phone(), "11111");
        assert_eq!(stored.customer_name(), "Ravi");
        assert_eq!(stored.total_amount(), original.total_amount());

        let found = ledger.find(BillField::CustomerPhone, "11111").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_update_stores_trimmed_values() {
        let ledger = ledger().await;
        ledger.save(&bill("10007", " Ravi ", "98765")).await.unwrap();

        let patch = BillPatch {
            customer_name: Some(" Meera ".to_string()),
            ..BillPatch::default()
        };
        assert!(ledger.update("10007", &patch).await.unwrap());

        let found = ledger.find(BillField::CustomerName, "Meera").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_name(), "Meera");
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let ledger = ledger().await;
        let patch = BillPatch {
            customer_name: Some("X".to_string()),
            ..BillPatch::default()
        };
        assert!(!ledger.update("404", &patch).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let ledger = ledger().await;
        ledger.save(&bill("10003", "Ravi", "1")).await.unwrap();

        assert!(ledger.delete("10003").await.unwrap());
        assert!(ledger.delete("10003").await.unwrap());
        assert!(ledger.get("10003").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let ledger = ledger().await;
        ledger.save(&bill("10004", "Ravi", "1")).await.unwrap();
        ledger.save(&bill("10005", "Ravi", "2")).await.unwrap();
        ledger.save(&bill("10006", "Meera", "3")).await.unwrap();

        let ravi = ledger.find(BillField::CustomerName, "Ravi").await.unwrap();
        assert_eq!(ravi.len(), 2);

        let by_no = ledger.find(BillField::BillNo, "10006").await.unwrap();
        assert_eq!(by_no[0].customer_name(), "Meera");

        let none = ledger.find(BillField::CustomerName, "Nobody").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let ledger = ledger().await;
        sqlx::query(
            "INSERT INTO bills VALUES ('bad', 'x', 'y', 0, '2024-01-01T00:00:00Z', '{not json')",
        )
        .execute(&ledger.pool)
        .await
        .unwrap();

        assert!(matches!(
            ledger.get("bad").await,
            Err(StoreError::Corrupt { id, .. }) if id == "bad"
        ));
    }

    #[tokio::test]
    async fn test_overflowing_quantity_is_corrupt_not_a_panic() {
        let ledger = ledger().await;
        let mut record = billdesk_core::to_record(&bill("10008", "Ravi", "1"));
        record.items[0].quantity = i64::MAX;
        let document = serde_json::to_string(&record).unwrap();
        sqlx::query("INSERT INTO bills VALUES ('10008', 'Ravi', '1', 0, '2024-01-01T00:00:00Z', ?)")
            .bind(&document)
            .execute(&ledger.pool)
            .await
            .unwrap();

        assert!(matches!(
            ledger.get("10008").await,
            Err(StoreError::Corrupt { id, .. }) if id == "10008"
        ));
        assert!(ledger.find(BillField::CustomerName, "Ravi").await.is_err());
    }
}
