//! # Store Traits
//!
//! The narrow interfaces the billing services talk to. Services hold
//! `Arc<dyn ...Store>` handles, so the SQLite repositories and the in-memory
//! stores are interchangeable.
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │   CatalogStore   │   │   LedgerStore    │   │    UserStore     │
//! │  list_all        │   │  save (upsert)   │   │  save            │
//! │  list_by_category│   │  get             │   │  get_by_id/email │
//! │  get             │   │  update (patch)  │   │  set_verified    │
//! │                  │   │  delete (idem.)  │   │  update_profile  │
//! │                  │   │  find (eq.)      │   │  tokens          │
//! └────────┬─────────┘   └────────┬─────────┘   └────────┬─────────┘
//!          │                      │                      │
//!   SqliteCatalog          SqliteLedger            SqliteUsers
//!   MemoryCatalog          MemoryLedger            MemoryUsers
//! ```

use async_trait::async_trait;
use billdesk_core::{Bill, BillField, BillPatch, Category, Product, User, UserPatch};

use crate::error::StoreResult;

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every product, in catalog order.
    async fn list_all(&self) -> StoreResult<Vec<Product>>;

    /// Products of one category, in catalog order.
    async fn list_by_category(&self, category: Category) -> StoreResult<Vec<Product>>;

    /// Point lookup. `None` when the product does not exist.
    async fn get(&self, product_id: &str) -> StoreResult<Option<Product>>;
}

/// The bill ledger, keyed by bill number.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Writes the bill under its number, replacing any existing document.
    async fn save(&self, bill: &Bill) -> StoreResult<String>;

    /// Point lookup. `None` when no bill has that number.
    async fn get(&self, bill_no: &str) -> StoreResult<Option<Bill>>;

    /// Merges the patch into the stored bill.
    ///
    /// Returns `false` when the bill does not exist.
    async fn update(&self, bill_no: &str, patch: &BillPatch) -> StoreResult<bool>;

    /// Removes the bill. Deleting a missing bill succeeds.
    async fn delete(&self, bill_no: &str) -> StoreResult<bool>;

    /// Bills whose `field` equals `value`. Order is unspecified.
    async fn find(&self, field: BillField, value: &str) -> StoreResult<Vec<Bill>>;
}

/// A user plus the credential material only the identity layer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
}

/// Shop owner accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new account. Fails with `UniqueViolation` on a taken email.
    async fn save(&self, record: &UserRecord) -> StoreResult<()>;

    async fn get_by_id(&self, uid: &str) -> StoreResult<Option<UserRecord>>;

    /// Lookup by email, case-insensitive.
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    async fn get_by_verification_token(&self, token: &str) -> StoreResult<Option<UserRecord>>;

    /// Returns `false` when the user does not exist.
    async fn set_email_verified(&self, uid: &str, verified: bool) -> StoreResult<bool>;

    /// Replaces (or clears) the pending verification token.
    async fn set_verification_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool>;

    async fn get_by_reset_token(&self, token: &str) -> StoreResult<Option<UserRecord>>;

    /// Replaces (or clears) the pending password reset token.
    async fn set_reset_token(&self, uid: &str, token: Option<&str>) -> StoreResult<bool>;

    /// Stores a new password hash. Returns `false` when the user does not
    /// exist.
    async fn set_password_hash(&self, uid: &str, password_hash: &str) -> StoreResult<bool>;

    /// Applies the present fields of the patch. Returns `false` when the user
    /// does not exist.
    async fn update_profile(&self, uid: &str, patch: &UserPatch) -> StoreResult<bool>;
}
