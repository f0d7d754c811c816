//! # Services
//!
//! Orchestration over injected stores.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout                                                               │
//! │  ├── CatalogService ──► Arc<dyn CatalogStore>   (snapshot, cached)     │
//! │  ├── compose()        (billdesk-core, pure)                             │
//! │  └── BillLedger ─────► Arc<dyn LedgerStore>     (create/get/update/...) │
//! │                                                                         │
//! │  ProfileService ────► Arc<dyn UserStore>        (shop header, edits)    │
//! │                                                                         │
//! │  Every store call goes through `with_timeout`.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod checkout;
pub mod ledger;
pub mod profile;

pub use catalog::CatalogService;
pub use checkout::Checkout;
pub use ledger::BillLedger;
pub use profile::ProfileService;

use std::future::Future;
use std::time::Duration;

use billdesk_db::{StoreError, StoreResult};

/// Runs a store call with an upper bound on its duration.
///
/// A call that runs out of time surfaces as `StoreError::Timeout` naming the
/// operation. The call itself is dropped, not retried.
pub async fn with_timeout<T, F>(operation: &str, limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, secs = limit.as_secs(), "Store call timed out");
            Err(StoreError::Timeout {
                operation: operation.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}
