//! # Bill Composition Engine
//!
//! Turns a cashier's selections into an immutable [`Bill`].
//!
//! ## Composition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        compose()                                        │
//! │                                                                         │
//! │  customer_name / customer_phone ──► empty? ──► ValidationError          │
//! │                                                                         │
//! │  Selection [(id, qty), ...]                                            │
//! │       │                                                                 │
//! │       ├── qty <= 0            → ignored                                 │
//! │       ├── qty > 999           → ValidationError::OutOfRange             │
//! │       ├── id not in catalog   → Composition::dropped                    │
//! │       └── otherwise           → LineItem (name + price frozen)          │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │              TaxTable::breakdown (subtotal + tax per category)          │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │              total_amount = Σ subtotals + Σ taxes                       │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                         Bill { created_at = now }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Composition is pure: nothing is written anywhere until the ledger saves
//! the bill.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::ValidationError;
use crate::tax::TaxTable;
use crate::types::{Bill, LineItem, Product};
use crate::validation::{validate_customer_name, validate_customer_phone, validate_quantity};
use crate::{BILL_NUMBER_MAX, BILL_NUMBER_MIN};

// =============================================================================
// Selection
// =============================================================================

/// Requested quantities keyed by product id, in the order they were entered.
///
/// Adding the same id twice accumulates its quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: Vec<(String, i64)>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Adds `quantity` to the entry for `product_id`.
    pub fn add(mut self, product_id: impl Into<String>, quantity: i64) -> Self {
        self.push(product_id, quantity);
        self
    }

    /// In-place form of [`Selection::add`].
    pub fn push(&mut self, product_id: impl Into<String>, quantity: i64) {
        let product_id = product_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, qty)) => *qty = qty.saturating_add(quantity),
            None => self.entries.push((product_id, quantity)),
        }
    }

    /// Replaces the quantity for `product_id` (0 clears it).
    pub fn set(&mut self, product_id: impl Into<String>, quantity: i64) {
        let product_id = product_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, qty)) => *qty = quantity,
            None => self.entries.push((product_id, quantity)),
        }
    }

    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.entries
            .iter()
            .find(|(id, _)| id == product_id)
            .map(|(_, qty)| *qty)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Selection {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        let mut selection = Selection::new();
        for (id, qty) in iter {
            selection.push(id, qty);
        }
        selection
    }
}

// =============================================================================
// Composition
// =============================================================================

/// Result of a successful composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub bill: Bill,

    /// Product ids with a positive quantity that were not in the catalog.
    pub dropped: Vec<String>,
}

/// Composes a bill stamped with the current time.
///
/// ## Errors
/// - `ValidationError::Required` if the customer name, phone or bill number
///   is empty (checked before any item)
/// - `ValidationError::OutOfRange` if a quantity exceeds
///   [`crate::MAX_ITEM_QUANTITY`]
/// - `ValidationError::NoItemsSelected` if no selection survives filtering
/// - `ValidationError::AmountOverflow` if a total leaves the i64 range
///
/// ## Example
/// ```rust
/// use billdesk_core::compose::{compose, Selection};
/// use billdesk_core::{Category, Money, Product, TaxTable};
///
/// let catalog = vec![
///     Product::new("A", "Sanitizer", Money::from_major(20), Category::Medical),
///     Product::new("B", "Rice", Money::from_major(35), Category::Grocery),
/// ];
/// let selection = Selection::new().add("A", 2).add("B", 1);
///
/// let composed = compose(&selection, &catalog, "Ravi", "98765", "10001", &TaxTable::default())
///     .unwrap();
/// assert_eq!(composed.bill.total_amount(), Money::from_minor(7735));
/// ```
pub fn compose(
    selection: &Selection,
    catalog: &[Product],
    customer_name: &str,
    customer_phone: &str,
    bill_no: impl Into<String>,
    taxes: &TaxTable,
) -> Result<Composition, ValidationError> {
    compose_at(
        selection,
        catalog,
        customer_name,
        customer_phone,
        bill_no,
        taxes,
        Utc::now(),
    )
}

/// [`compose`] with an explicit timestamp.
pub fn compose_at(
    selection: &Selection,
    catalog: &[Product],
    customer_name: &str,
    customer_phone: &str,
    bill_no: impl Into<String>,
    taxes: &TaxTable,
    created_at: DateTime<Utc>,
) -> Result<Composition, ValidationError> {
    validate_customer_name(customer_name)?;
    validate_customer_phone(customer_phone)?;

    let bill_no = bill_no.into();
    if bill_no.trim().is_empty() {
        return Err(ValidationError::required("bill_no"));
    }

    let by_id: HashMap<&str, &Product> = catalog
        .iter()
        .map(|p| (p.product_id.as_str(), p))
        .collect();

    let mut items = Vec::new();
    let mut categorized = Vec::new();
    let mut dropped = Vec::new();

    for (product_id, quantity) in selection.iter() {
        if quantity <= 0 {
            continue;
        }
        validate_quantity(quantity)?;
        match by_id.get(product_id) {
            Some(product) => {
                let item = LineItem::from_product(product, quantity)?;
                categorized.push((product.category, item.line_total()));
                items.push(item);
            }
            None => dropped.push(product_id.to_string()),
        }
    }

    if items.is_empty() {
        return Err(ValidationError::NoItemsSelected);
    }

    let breakdown = taxes.breakdown(categorized)?;
    let total_amount = breakdown
        .checked_grand_total()
        .ok_or_else(|| ValidationError::overflow("total_amount"))?;

    let bill = Bill::from_parts(
        bill_no,
        customer_name.trim().to_string(),
        customer_phone.trim().to_string(),
        items,
        breakdown,
        total_amount,
        created_at,
    );

    Ok(Composition { bill, dropped })
}

// =============================================================================
// Bill Numbers
// =============================================================================

/// Draws a five-digit bill number.
///
/// Uniqueness is best effort: the space holds 90,000 numbers and nothing
/// here checks the ledger. See `BillLedger::create_fresh` for the redraw.
pub fn generate_bill_number() -> String {
    rand::thread_rng()
        .gen_range(BILL_NUMBER_MIN..=BILL_NUMBER_MAX)
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Category;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("A", "Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("B", "Rice", Money::from_major(35), Category::Grocery),
            Product::new("C", "Coke", Money::from_major(20), Category::Drinks),
        ]
    }

    fn compose_default(selection: &Selection) -> Result<Composition, ValidationError> {
        compose(selection, &catalog(), "Ravi", "9876543210", "10001", &TaxTable::default())
    }

    #[test]
    fn test_worked_example() {
        let selection = Selection::new().add("A", 2).add("B", 1);
        let Composition { bill, dropped } = compose_default(&selection).unwrap();

        assert!(dropped.is_empty());
        let b = bill.breakdown();
        assert_eq!(b.medical.subtotal, Money::from_minor(4000));
        assert_eq!(b.medical.tax, Money::from_minor(200));
        assert_eq!(b.grocery.subtotal, Money::from_minor(3500));
        assert_eq!(b.grocery.tax, Money::from_minor(35));
        assert!(b.drinks.subtotal.is_zero());
        assert_eq!(bill.total_amount(), Money::from_minor(7735));
        assert_eq!(bill.total_amount().to_string(), "77.35");
    }

    #[test]
    fn test_total_is_sum_of_parts_for_every_combination() {
        let ids = ["A", "B", "C"];
        for mask in 1u8..8 {
            let selection: Selection = ids
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(i, id)| (*id, i as i64 + 1))
                .collect();
            let bill = compose_default(&selection).unwrap().bill;
            let b = bill.breakdown();
            assert_eq!(bill.total_amount(), b.subtotal_sum() + b.tax_sum());
            let lines: Money = bill.items().iter().map(|i| i.line_total()).sum();
            assert_eq!(lines, b.subtotal_sum());
        }
    }

    #[test]
    fn test_zero_quantity_alone_fails() {
        let selection = Selection::new().add("A", 0);
        assert!(matches!(
            compose_default(&selection),
            Err(ValidationError::NoItemsSelected)
        ));
    }

    #[test]
    fn test_only_unknown_products_fails() {
        let selection = Selection::new().add("ghost", 3);
        assert!(matches!(
            compose_default(&selection),
            Err(ValidationError::NoItemsSelected)
        ));
    }

    #[test]
    fn test_unknown_products_are_reported() {
        let selection = Selection::new().add("A", 1).add("ghost", 2).add("gone", 0);
        let composed = compose_default(&selection).unwrap();
        assert_eq!(composed.dropped, vec!["ghost".to_string()]);
        assert_eq!(composed.bill.items().len(), 1);
    }

    #[test]
    fn test_empty_customer_fields_fail_regardless_of_items() {
        let selection = Selection::new().add("A", 1);
        let taxes = TaxTable::default();

        let err = compose(&selection, &catalog(), "", "98765", "1", &taxes).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "customer_name"));

        let err = compose(&selection, &catalog(), "Ravi", "  ", "1", &taxes).unwrap_err();
        assert!(matches!(err, ValidationError::Required { field } if field == "customer_phone"));

        // Name is checked before items.
        let err = compose(&Selection::new(), &catalog(), "", "", "1", &taxes).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_prices_are_snapshotted() {
        let mut products = catalog();
        let selection = Selection::new().add("A", 1);
        let bill = compose(&selection, &products, "R", "1", "1", &TaxTable::default())
            .unwrap()
            .bill;

        products[0].unit_price = Money::from_major(99);
        products[0].name = "Renamed".to_string();

        assert_eq!(bill.items()[0].unit_price(), Money::from_major(20));
        assert_eq!(bill.items()[0].product_name(), "Sanitizer");
    }

    #[test]
    fn test_items_keep_selection_order_and_accumulate() {
        let selection = Selection::new().add("C", 1).add("A", 1).add("C", 2);
        let bill = compose_default(&selection).unwrap().bill;
        let ids: Vec<&str> = bill.items().iter().map(|i| i.product_id()).collect();
        assert_eq!(ids, vec!["C", "A"]);
        assert_eq!(bill.items()[0].quantity(), 3);
    }

    #[test]
    fn test_half_up_rounding_on_category_tax() {
        // 0.50 at 1% = 0.005 → 0.01
        let catalog = vec![Product::new("X", "Spice", Money::from_minor(50), Category::Grocery)];
        let selection = Selection::new().add("X", 1);
        let bill = compose(&selection, &catalog, "R", "1", "1", &TaxTable::default())
            .unwrap()
            .bill;
        assert_eq!(bill.breakdown().grocery.tax, Money::from_minor(1));
        assert_eq!(bill.total_amount(), Money::from_minor(51));
    }

    #[test]
    fn test_customer_fields_are_trimmed() {
        let selection = Selection::new().add("A", 1);
        let bill = compose(&selection, &catalog(), "  Ravi ", " 98765 ", "1", &TaxTable::default())
            .unwrap()
            .bill;
        assert_eq!(bill.customer_name(), "Ravi");
        assert_eq!(bill.customer_phone(), "98765");
    }

    #[test]
    fn test_quantity_above_limit_is_rejected() {
        let selection = Selection::new().add("A", 1).add("B", i64::MAX / 100);
        assert!(matches!(
            compose_default(&selection),
            Err(ValidationError::OutOfRange { field, max, .. })
                if field == "quantity" && max == crate::MAX_ITEM_QUANTITY
        ));

        let at_limit = Selection::new().add("A", crate::MAX_ITEM_QUANTITY);
        let bill = compose_default(&at_limit).unwrap().bill;
        assert_eq!(bill.items()[0].line_total(), Money::from_major(20 * 999));
    }

    #[test]
    fn test_huge_price_overflows_into_an_error() {
        let price = Money::from_minor(i64::MAX - 10);
        let catalog = vec![Product::new("X", "Gold", price, Category::Grocery)];
        let selection = Selection::new().add("X", 3);
        assert!(matches!(
            compose(&selection, &catalog, "R", "1", "1", &TaxTable::default()),
            Err(ValidationError::AmountOverflow { field }) if field == "line_total"
        ));

        let selection = Selection::new().add("X", 1);
        assert!(matches!(
            compose(&selection, &catalog, "R", "1", "1", &TaxTable::default()),
            Err(ValidationError::AmountOverflow { field }) if field == "total_amount"
        ));
    }

    #[test]
    fn test_generate_bill_number_in_range() {
        for _ in 0..200 {
            let no: u32 = generate_bill_number().parse().unwrap();
            assert!((BILL_NUMBER_MIN..=BILL_NUMBER_MAX).contains(&no));
        }
    }
}
