//! # Tax Table
//!
//! Per-category tax rates and the subtotal → tax step of composition.
//!
//! ```text
//! subtotals by category          TaxTable              CategoryBreakdown
//! ─────────────────────   ──────────────────────   ─────────────────────────
//! medical   40.00    ──►  medical   500 bps   ──►  medical   40.00 / 2.00
//! grocery   35.00    ──►  grocery   100 bps   ──►  grocery   35.00 / 0.35
//! drinks     0.00    ──►  drinks   1000 bps   ──►  drinks     0.00 / 0.00
//! ```
//!
//! Rates are configuration, read only through [`TaxTable::rate_for`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Category, CategoryBreakdown, TaxRate};
use crate::validation::{validate_tax_rate_bps, ValidationResult};

/// Default medical rate: 5%.
pub const DEFAULT_MEDICAL_BPS: u32 = 500;
/// Default grocery rate: 1%.
pub const DEFAULT_GROCERY_BPS: u32 = 100;
/// Default cold drinks rate: 10%.
pub const DEFAULT_DRINKS_BPS: u32 = 1000;

/// One tax rate per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxTable {
    pub medical: TaxRate,
    pub grocery: TaxRate,
    pub drinks: TaxRate,
}

impl Default for TaxTable {
    fn default() -> Self {
        TaxTable {
            medical: TaxRate::from_bps(DEFAULT_MEDICAL_BPS),
            grocery: TaxRate::from_bps(DEFAULT_GROCERY_BPS),
            drinks: TaxRate::from_bps(DEFAULT_DRINKS_BPS),
        }
    }
}

impl TaxTable {
    /// Builds a table from basis points, rejecting rates above 100%.
    pub fn from_bps(medical: u32, grocery: u32, drinks: u32) -> ValidationResult<Self> {
        validate_tax_rate_bps(medical)?;
        validate_tax_rate_bps(grocery)?;
        validate_tax_rate_bps(drinks)?;
        Ok(TaxTable {
            medical: TaxRate::from_bps(medical),
            grocery: TaxRate::from_bps(grocery),
            drinks: TaxRate::from_bps(drinks),
        })
    }

    /// The rate applied to a category's subtotal.
    pub fn rate_for(&self, category: Category) -> TaxRate {
        match category {
            Category::Medical => self.medical,
            Category::Grocery => self.grocery,
            Category::Drinks => self.drinks,
        }
    }

    /// Sums line totals per category, then taxes each category subtotal once.
    ///
    /// Tax is computed on the category subtotal, never per line, so rounding
    /// happens exactly once per category. A subtotal that overflows is a
    /// `ValidationError::AmountOverflow`.
    pub fn breakdown<I>(&self, lines: I) -> ValidationResult<CategoryBreakdown>
    where
        I: IntoIterator<Item = (Category, Money)>,
    {
        let mut breakdown = CategoryBreakdown::default();
        for (category, line_total) in lines {
            let totals = breakdown.get_mut(category);
            totals.subtotal = totals
                .subtotal
                .checked_add(line_total)
                .ok_or_else(|| ValidationError::overflow("subtotal"))?;
        }
        for category in Category::ALL {
            let totals = breakdown.get_mut(category);
            totals.tax = totals.subtotal.calculate_tax(self.rate_for(category));
        }
        Ok(breakdown)
    }
}
