//! # Persisted Bill Document
//!
//! The document shape a bill takes in the ledger. This is the one format
//! whose compatibility matters: field names and decimal money values match
//! the documents the shop has always written.
//!
//! ```json
//! { "bill_no": "48213", "customer_name": "Ravi", "customer_phone": "98765",
//!   "items": [{"product_id": "med_1", "product_name": "Sanitizer",
//!              "quantity": 2, "price": 20.0, "total": 40.0}],
//!   "medical_total": 40.0, "grocery_total": 0.0, "drinks_total": 0.0,
//!   "medical_tax": 2.0, "grocery_tax": 0.0, "drinks_tax": 0.0,
//!   "total_amount": 42.0, "timestamp": "2026-10-15T10:20:30.123456789Z" }
//! ```
//!
//! Decoding re-checks every derived number against the items and rejects a
//! document where they disagree. Item categories are not stored, so decoding
//! can only check the category totals in aggregate.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::{Bill, CategoryBreakdown, CategoryTotals, LineItem};

/// One line of a persisted bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
}

/// A bill as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    pub bill_no: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<ItemRecord>,
    pub medical_total: f64,
    pub grocery_total: f64,
    pub drinks_total: f64,
    pub medical_tax: f64,
    pub grocery_tax: f64,
    pub drinks_tax: f64,
    pub total_amount: f64,
    pub timestamp: String,
}

/// Encodes a bill into its document form.
pub fn to_record(bill: &Bill) -> BillRecord {
    let b = bill.breakdown();
    BillRecord {
        bill_no: bill.bill_no().to_string(),
        customer_name: bill.customer_name().to_string(),
        customer_phone: bill.customer_phone().to_string(),
        items: bill
            .items()
            .iter()
            .map(|item| ItemRecord {
                product_id: item.product_id().to_string(),
                product_name: item.product_name().to_string(),
                quantity: item.quantity(),
                price: item.unit_price().to_decimal(),
                total: item.line_total().to_decimal(),
            })
            .collect(),
        medical_total: b.medical.subtotal.to_decimal(),
        grocery_total: b.grocery.subtotal.to_decimal(),
        drinks_total: b.drinks.subtotal.to_decimal(),
        medical_tax: b.medical.tax.to_decimal(),
        grocery_tax: b.grocery.tax.to_decimal(),
        drinks_tax: b.drinks.tax.to_decimal(),
        total_amount: bill.total_amount().to_decimal(),
        timestamp: format_timestamp(bill.created_at()),
    }
}

impl From<&Bill> for BillRecord {
    fn from(bill: &Bill) -> Self {
        to_record(bill)
    }
}

impl TryFrom<BillRecord> for Bill {
    type Error = CoreError;

    fn try_from(record: BillRecord) -> Result<Self, Self::Error> {
        let bill_no = record.bill_no;
        let invalid = |reason: String| CoreError::InvalidRecord {
            bill_no: bill_no.clone(),
            reason,
        };
        let money = |field: &str, value: f64| {
            Money::from_decimal(value)
                .ok_or_else(|| invalid(format!("{} is not a money amount: {}", field, value)))
        };

        let mut items = Vec::with_capacity(record.items.len());
        for item in record.items {
            if item.quantity <= 0 {
                return Err(invalid(format!(
                    "item {} has quantity {}",
                    item.product_id, item.quantity
                )));
            }
            let price = money("price", item.price)?;
            let total = money("total", item.total)?;
            let line = LineItem::new(item.product_id, item.product_name, item.quantity, price)
                .map_err(|e| invalid(format!("item quantity {}: {}", item.quantity, e)))?;
            if line.line_total() != total {
                return Err(invalid(format!(
                    "item {} total {} != {} x {}",
                    line.product_id(),
                    total,
                    price,
                    item.quantity
                )));
            }
            items.push(line);
        }

        let breakdown = CategoryBreakdown {
            medical: CategoryTotals {
                subtotal: money("medical_total", record.medical_total)?,
                tax: money("medical_tax", record.medical_tax)?,
            },
            grocery: CategoryTotals {
                subtotal: money("grocery_total", record.grocery_total)?,
                tax: money("grocery_tax", record.grocery_tax)?,
            },
            drinks: CategoryTotals {
                subtotal: money("drinks_total", record.drinks_total)?,
                tax: money("drinks_tax", record.drinks_tax)?,
            },
        };

        let lines = Money::checked_sum(items.iter().map(|i| i.line_total()))
            .ok_or_else(|| invalid("item totals overflow".to_string()))?;
        let subtotals = breakdown
            .checked_subtotal_sum()
            .ok_or_else(|| invalid("category totals overflow".to_string()))?;
        if lines != subtotals {
            return Err(invalid(format!(
                "category totals {} != item totals {}",
                subtotals, lines
            )));
        }

        let total_amount = money("total_amount", record.total_amount)?;
        if breakdown.checked_grand_total() != Some(total_amount) {
            return Err(invalid(format!(
                "total_amount {} != subtotals + taxes",
                total_amount
            )));
        }

        let created_at =
            parse_timestamp(&record.timestamp).map_err(|reason| invalid(reason))?;

        Ok(Bill::from_parts(
            bill_no,
            record.customer_name,
            record.customer_phone,
            items,
            breakdown,
            total_amount,
            created_at,
        ))
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// RFC 3339 with nanoseconds, always `Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("timestamp '{}' is not ISO-8601: {}", value, e))
}
