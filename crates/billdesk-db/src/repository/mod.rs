//! # Repository Module
//!
//! SQLite implementations of the store traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service (BillLedger, CatalogService, LocalIdentity)                    │
//! │       │  Arc<dyn LedgerStore>                                           │
//! │       ▼                                                                 │
//! │  SqliteLedger / SqliteCatalog / SqliteUsers                             │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SqliteCatalog`] - Product listing, lookup and seeding
//! - [`SqliteLedger`] - Bill documents
//! - [`SqliteUsers`] - Shop owner accounts

pub mod catalog;
pub mod ledger;
pub mod user;

pub use catalog::SqliteCatalog;
pub use ledger::SqliteLedger;
pub use user::SqliteUsers;
