//! # billdesk-core: Pure Billing Logic for BillDesk
//!
//! Everything that decides what a bill says lives here, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BillDesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    billdesk CLI (clap)                          │   │
//! │  │    signup ──► login ──► catalog ──► bill ──► show/update/...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       Services: BillLedger, CatalogService, Session             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  compose  │  │  record   │  │   │
//! │  │   │  Product  │  │   Money   │  │ Selection │  │ BillRecord│  │   │
//! │  │   │   Bill    │  │ TaxTable  │  │  Bill no. │  │ timestamp │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 billdesk-db (Store Layer)                       │   │
//! │  │        SQLite + in-memory catalog, ledger and user stores       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Bill, LineItem, User, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`tax`] - Per-category tax table
//! - [`compose`] - Bill composition and bill numbers
//! - [`record`] - Persisted document shape
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use billdesk_core::money::Money;
//! use billdesk_core::types::TaxRate;
//!
//! let subtotal = Money::from_major(35);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(100)); // 1%
//! assert_eq!(tax.minor(), 35);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod compose;
pub mod error;
pub mod money;
pub mod record;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use compose::{compose, compose_at, generate_bill_number, Composition, Selection};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use record::{to_record, BillRecord, ItemRecord};
pub use tax::TaxTable;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest bill number [`generate_bill_number`] draws.
pub const BILL_NUMBER_MIN: u32 = 10_000;

/// Largest bill number [`generate_bill_number`] draws.
pub const BILL_NUMBER_MAX: u32 = 99_999;

/// Maximum quantity of a single product on one bill.
///
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;
