//! # Domain Types
//!
//! Core domain types used throughout BillDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Bill       │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  bill_no        │   │  product_id     │       │
//! │  │  name           │   │  customer_*     │   │  product_name   │       │
//! │  │  unit_price     │   │  items          │   │  quantity       │       │
//! │  │  category       │   │  breakdown      │   │  unit_price     │       │
//! │  └─────────────────┘   │  total_amount   │   │  line_total     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Category     │   │   BillPatch     │       │
//! │  │  bps (u32)      │   │  Medical        │   │  customer_name  │       │
//! │  │  500 = 5%       │   │  Grocery        │   │  customer_phone │       │
//! │  └─────────────────┘   │  Drinks         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `LineItem` copies the product's name and price at composition time.
//! Later catalog edits never reach a bill that already exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5% and 1000 bps = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Formats as a percentage without trailing zeros: `5%`, `8.25%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Product classification that selects the tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Medical,
    Grocery,
    Drinks,
}

impl Category {
    /// Every category, in the order bills and receipts list them.
    pub const ALL: [Category; 3] = [Category::Medical, Category::Grocery, Category::Drinks];

    /// Stored/document form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Medical => "medical",
            Category::Grocery => "grocery",
            Category::Drinks => "drinks",
        }
    }

    /// Label used on receipts.
    pub const fn label(&self) -> &'static str {
        match self {
            Category::Medical => "Medical",
            Category::Grocery => "Grocery",
            Category::Drinks => "Cold Drinks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medical" => Ok(Category::Medical),
            "grocery" => Ok(Category::Grocery),
            "drinks" | "cold drinks" | "cold_drinks" => Ok(Category::Drinks),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique key in the catalog (e.g. `med_1`).
    pub product_id: String,

    /// Display name shown on the bill.
    pub name: String,

    /// Price per unit.
    pub unit_price: Money,

    /// Category driving the tax rate.
    pub category: Category,
}

impl Product {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        category: Category,
    ) -> Self {
        Product {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            category,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product-and-quantity entry within a bill.
///
/// `line_total` is computed by the constructor and cannot be set
/// independently, so `line_total == unit_price × quantity` always holds.
/// The constructor refuses a product that does not fit in [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price: Money,
    line_total: Money,
}

impl LineItem {
    /// Creates a line item, computing the line total.
    ///
    /// ## Errors
    /// - `ValidationError::AmountOverflow` if `unit_price × quantity`
    ///   overflows
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, ValidationError> {
        let line_total = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::overflow("line_total"))?;

        Ok(LineItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total,
        })
    }

    /// Freezes the product's current name and price.
    pub fn from_product(product: &Product, quantity: i64) -> Result<Self, ValidationError> {
        LineItem::new(
            product.product_id.clone(),
            product.name.clone(),
            quantity,
            product.unit_price,
        )
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }
}

// =============================================================================
// Category Totals
// =============================================================================

/// Subtotal and tax for a single category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub subtotal: Money,
    pub tax: Money,
}

/// Per-category subtotal and tax for every known category.
///
/// Categories with no items carry zero for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub medical: CategoryTotals,
    pub grocery: CategoryTotals,
    pub drinks: CategoryTotals,
}

impl CategoryBreakdown {
    pub fn get(&self, category: Category) -> CategoryTotals {
        match category {
            Category::Medical => self.medical,
            Category::Grocery => self.grocery,
            Category::Drinks => self.drinks,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryTotals {
        match category {
            Category::Medical => &mut self.medical,
            Category::Grocery => &mut self.grocery,
            Category::Drinks => &mut self.drinks,
        }
    }

    /// Iterates `(category, totals)` in [`Category::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, CategoryTotals)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn subtotal_sum(&self) -> Money {
        self.iter().map(|(_, t)| t.subtotal).sum()
    }

    pub fn tax_sum(&self) -> Money {
        self.iter().map(|(_, t)| t.tax).sum()
    }

    /// Σ subtotals, or `None` on overflow.
    pub fn checked_subtotal_sum(&self) -> Option<Money> {
        Money::checked_sum(self.iter().map(|(_, t)| t.subtotal))
    }

    /// Σ subtotals + Σ taxes, or `None` on overflow.
    pub fn checked_grand_total(&self) -> Option<Money> {
        Money::checked_sum(self.iter().flat_map(|(_, t)| [t.subtotal, t.tax]))
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A completed sale: itemized lines, per-category totals, and grand total.
///
/// Bills are built by [`crate::compose::compose`] or decoded from a stored
/// [`crate::record::BillRecord`]. There are no setters; a changed bill is a
/// new value ([`Bill::with_bill_no`], [`Bill::apply_patch`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    bill_no: String,
    customer_name: String,
    customer_phone: String,
    items: Vec<LineItem>,
    breakdown: CategoryBreakdown,
    total_amount: Money,
    created_at: DateTime<Utc>,
}

impl Bill {
    /// Assembles a bill from already-computed parts.
    ///
    /// Only composition and record decoding call this; both guarantee the
    /// totals belong to the items.
    pub(crate) fn from_parts(
        bill_no: String,
        customer_name: String,
        customer_phone: String,
        items: Vec<LineItem>,
        breakdown: CategoryBreakdown,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Bill {
            bill_no,
            customer_name,
            customer_phone,
            items,
            breakdown,
            total_amount,
            created_at,
        }
    }

    pub fn bill_no(&self) -> &str {
        &self.bill_no
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn breakdown(&self) -> &CategoryBreakdown {
        &self.breakdown
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the same bill under a different bill number.
    ///
    /// Used when the ledger redraws a colliding number before the first save.
    pub fn with_bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.bill_no = bill_no.into();
        self
    }

    /// Returns a copy with the patch's customer fields applied.
    ///
    /// Values are trimmed the same way composition trims them. Financial
    /// fields are out of a patch's reach.
    pub fn apply_patch(&self, patch: &BillPatch) -> Self {
        let mut bill = self.clone();
        if let Some(name) = &patch.customer_name {
            bill.customer_name = name.trim().to_string();
        }
        if let Some(phone) = &patch.customer_phone {
            bill.customer_phone = phone.trim().to_string();
        }
        bill
    }

    /// Value of a searchable field, for equality filters.
    pub fn field(&self, field: BillField) -> &str {
        match field {
            BillField::BillNo => &self.bill_no,
            BillField::CustomerName => &self.customer_name,
            BillField::CustomerPhone => &self.customer_phone,
        }
    }
}

// =============================================================================
// Bill Patch / Search Field
// =============================================================================

/// Typed partial update for a stored bill.
///
/// Only customer contact fields are mutable after creation. Anything that
/// changes money is a re-composition followed by a full replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
}

impl BillPatch {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none() && self.customer_phone.is_none()
    }

    /// The same patch with surrounding whitespace removed from each value.
    pub fn trimmed(&self) -> Self {
        BillPatch {
            customer_name: self.customer_name.as_deref().map(|s| s.trim().to_string()),
            customer_phone: self.customer_phone.as_deref().map(|s| s.trim().to_string()),
        }
    }

    /// Checks the patch carries at least one field and no blank values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NoUpdateFields);
        }
        if let Some(name) = &self.customer_name {
            crate::validation::validate_customer_name(name)?;
        }
        if let Some(phone) = &self.customer_phone {
            crate::validation::validate_customer_phone(phone)?;
        }
        Ok(())
    }
}

/// A bill field that supports equality search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillField {
    BillNo,
    CustomerName,
    CustomerPhone,
}

impl BillField {
    /// Field name in the persisted document.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillField::BillNo => "bill_no",
            BillField::CustomerName => "customer_name",
            BillField::CustomerPhone => "customer_phone",
        }
    }
}

impl fmt::Display for BillField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bill_no" => Ok(BillField::BillNo),
            "customer_name" => Ok(BillField::CustomerName),
            "customer_phone" => Ok(BillField::CustomerPhone),
            _ => Err(ValidationError::NotAllowed {
                field: "search field".to_string(),
                allowed: vec![
                    "bill_no".to_string(),
                    "customer_name".to_string(),
                    "customer_phone".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// An authenticated shop owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub shop_name: String,
    pub shop_address: String,
}

impl User {
    /// The slice of the profile printed on receipts.
    pub fn shop_details(&self) -> ShopDetails {
        ShopDetails {
            shop_name: self.shop_name.clone(),
            shop_address: self.shop_address.clone(),
            email: self.email.clone(),
        }
    }
}

/// Shop header printed on a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopDetails {
    pub shop_name: String,
    pub shop_address: String,
    pub email: String,
}

/// Typed partial update of a user profile.
///
/// Identity fields (`uid`, `email`) are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_address: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.shop_name.is_none() && self.shop_address.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(shop_name) = &self.shop_name {
            user.shop_name = shop_name.clone();
        }
        if let Some(shop_address) = &self.shop_address {
            user.shop_address = shop_address.clone();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
