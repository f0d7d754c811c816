//! # BillDesk
//!
//! Billing for a small shop: compose bills from a three-category catalog,
//! tax each category, keep a ledger of bills, and print receipts.
//!
//! ## Module Organization
//! ```text
//! billdesk/
//! ├── lib.rs          ◄─── You are here (App wiring, tracing setup)
//! ├── config.rs       ◄─── AppConfig: defaults, TOML, BILLDESK_* env
//! ├── error.rs        ◄─── AppError { code, message } for the CLI
//! ├── identity.rs     ◄─── Accounts, email verification, Session gate
//! ├── render.rs       ◄─── Text and PDF receipts, the receipt archive
//! └── services/
//!     ├── catalog.rs  ◄─── Cached catalog snapshot
//!     ├── checkout.rs ◄─── compose + create_fresh
//!     ├── ledger.rs   ◄─── Bill lifecycle (create/get/update/delete/search)
//!     └── profile.rs  ◄─── Shop details and profile edits
//! ```
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppConfig ──► Database (SQLite pool + migrations)                      │
//! │                  │                                                      │
//! │                  ├── SqliteCatalog ──► CatalogService ──┐               │
//! │                  ├── SqliteLedger ───► BillLedger ──────┼──► Checkout   │
//! │                  └── SqliteUsers ────► LocalIdentity ──► Session        │
//! │                                   └──► ProfileService                   │
//! │                                                                         │
//! │  Every service takes its store as Arc<dyn Trait>; tests pass the        │
//! │  in-memory stores through App::from_stores.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod render;
pub mod services;

use std::path::PathBuf;
use std::sync::Arc;

use billdesk_core::{Bill, ShopDetails, TaxTable, User};
use billdesk_db::{CatalogStore, Database, LedgerStore, UserStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::AppResult;
use identity::{IdentityError, LocalIdentity, Session};
use render::{ReceiptArchive, Renderer, TextReceiptRenderer};
use services::{BillLedger, CatalogService, Checkout, ProfileService};

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins when set. Otherwise `-v` selects `debug` and `-vv`
/// selects `trace`; without flags the configured filter applies. Logs go to
/// stderr so command output on stdout stays clean.
pub fn init_tracing(configured: &str, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new(configured),
        1 => EnvFilter::new("debug,sqlx=warn"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Store handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub users: Arc<dyn UserStore>,
}

/// Everything a command needs, built once per process.
pub struct App {
    pub config: AppConfig,
    pub taxes: TaxTable,
    pub catalog: Arc<CatalogService>,
    pub ledger: BillLedger,
    pub checkout: Checkout,
    pub identity: Arc<LocalIdentity>,
    pub session: Session,
    pub profiles: ProfileService,
    pub renderer: Arc<dyn Renderer>,
    pub archive: ReceiptArchive,
    db: Option<Database>,
}

impl App {
    /// Connects to the configured SQLite database and wires the services.
    pub async fn open(config: AppConfig) -> AppResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!(path = ?config.database.path, "Database ready");

        let stores = Stores {
            catalog: Arc::new(db.catalog()),
            ledger: Arc::new(db.ledger()),
            users: Arc::new(db.users()),
        };

        let mut app = App::from_stores(config, stores)?;
        app.db = Some(db);
        Ok(app)
    }

    /// Wires the services over arbitrary stores.
    pub fn from_stores(config: AppConfig, stores: Stores) -> AppResult<Self> {
        let taxes = config.tax_table()?;
        let timeout = config.store_timeout();

        let catalog = Arc::new(CatalogService::new(stores.catalog, timeout));
        let ledger = BillLedger::new(stores.ledger, timeout)
            .max_attempts(config.stores.bill_number_attempts);
        let checkout = Checkout::new(Arc::clone(&catalog), ledger.clone(), taxes);
        let identity = Arc::new(LocalIdentity::new(Arc::clone(&stores.users), timeout));
        let session = Session::new(identity.clone());
        let profiles = ProfileService::new(stores.users, timeout);
        let archive = ReceiptArchive::new(&config.paths.bills_dir);

        Ok(App {
            taxes,
            catalog,
            ledger,
            checkout,
            identity,
            session,
            profiles,
            renderer: config.receipts.format.renderer(),
            archive,
            config,
            db: None,
        })
    }

    /// The SQLite database, when the app was opened on one.
    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    /// Signs in and passes the verification gate.
    pub async fn sign_in_verified(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> AppResult<User> {
        let (Some(email), Some(password)) = (email, password) else {
            return Err(IdentityError::NotSignedIn.into());
        };

        self.session.sign_in(email, password).await?;
        Ok(self.session.require_verified_user().await?)
    }

    /// Shop header of the signed-in user, blank when nobody is signed in.
    async fn shop_details(&self) -> AppResult<ShopDetails> {
        Ok(match self.session.current_user().await {
            Some(user) => self.profiles.shop_details(&user.uid).await?,
            None => ShopDetails::default(),
        })
    }

    /// Text receipt with the signed-in user's shop header, for the terminal.
    pub async fn render_receipt(&self, bill: &Bill) -> AppResult<String> {
        let shop = self.shop_details().await?;
        Ok(TextReceiptRenderer.text(bill, &shop, &self.taxes))
    }

    /// Renders a bill in the configured format and writes it to the archive.
    pub async fn archive_receipt(&self, bill: &Bill) -> AppResult<PathBuf> {
        let shop = self.shop_details().await?;
        Ok(self
            .archive
            .save(self.renderer.as_ref(), bill, &shop, &self.taxes)?)
    }

    pub async fn close(&self) {
        self.session.sign_out().await;
        if let Some(db) = &self.db {
            db.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::{Money, Selection};
    use billdesk_db::seed::default_catalog;
    use billdesk_db::{MemoryCatalog, MemoryLedger, MemoryUsers};

    use crate::error::ErrorCode;
    use crate::identity::{IdentityProvider, SignUp};

    fn app(bills_dir: &std::path::Path) -> App {
        let mut config = AppConfig::default();
        config.paths.bills_dir = bills_dir.to_path_buf();
        App::from_stores(
            config,
            Stores {
                catalog: Arc::new(MemoryCatalog::new(default_catalog())),
                ledger: Arc::new(MemoryLedger::new()),
                users: Arc::new(MemoryUsers::new()),
            },
        )
        .unwrap()
    }

    async fn verified_owner(app: &App) {
        let verification = app
            .identity
            .sign_up(&SignUp {
                email: "asha@shop.in".to_string(),
                password: "counter-42".to_string(),
                name: "Asha".to_string(),
                shop_name: "Asha General Store".to_string(),
                shop_address: "12 market road".to_string(),
            })
            .await
            .unwrap();
        app.identity.confirm_email(&verification.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_billing_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let err = app.sign_in_verified(None, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }

    #[tokio::test]
    async fn test_unverified_owner_is_gated() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        app.identity
            .sign_up(&SignUp {
                email: "new@shop.in".to_string(),
                password: "counter-42".to_string(),
                name: "New".to_string(),
                ..SignUp::default()
            })
            .await
            .unwrap();

        let err = app
            .sign_in_verified(Some("new@shop.in"), Some("counter-42"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailNotVerified);
    }

    #[tokio::test]
    async fn test_end_to_end_bill() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        verified_owner(&app).await;
        app.sign_in_verified(Some("asha@shop.in"), Some("counter-42"))
            .await
            .unwrap();

        let selection = Selection::new().add("med_1", 2).add("gro_1", 1);
        let composition = app.checkout.checkout(&selection, "Ravi", "98765").await.unwrap();
        assert_eq!(composition.bill.total_amount(), Money::from_minor(7735));

        let receipt = app.render_receipt(&composition.bill).await.unwrap();
        assert!(receipt.contains("ASHA GENERAL STORE"));
        assert!(receipt.contains("₹77.35"));

        let path = app.archive_receipt(&composition.bill).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-"));

        app.close().await;
        assert!(app.session.current_user().await.is_none());
    }
}
