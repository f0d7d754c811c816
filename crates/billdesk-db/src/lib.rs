//! # billdesk-db: Store Layer for BillDesk
//!
//! Catalog, ledger and user stores: the traits the services depend on, the
//! SQLite repositories that back them in production, and in-memory versions
//! for tests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BillDesk Data Flow                               │
//! │                                                                         │
//! │  BillLedger::create(&bill)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   billdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   store.rs    │    │  repository/  │    │  Migrations  │  │   │
//! │  │   │ CatalogStore  │◄───│ SqliteCatalog │    │  (embedded)  │  │   │
//! │  │   │ LedgerStore   │◄───│ SqliteLedger  │    │ 001_initial  │  │   │
//! │  │   │ UserStore     │◄───│ SqliteUsers   │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │          ▲                     │ pool.rs                        │   │
//! │  │          └── memory.rs         │                                │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                   <data dir>/billdesk.db                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billdesk_db::{Database, DbConfig, LedgerStore};
//!
//! let db = Database::new(DbConfig::new("path/to/billdesk.db")).await?;
//! let bill = db.ledger().get("48213").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryCatalog, MemoryLedger, MemoryUsers};
pub use pool::{Database, DbConfig};
pub use repository::{SqliteCatalog, SqliteLedger, SqliteUsers};
pub use store::{CatalogStore, LedgerStore, UserRecord, UserStore};
