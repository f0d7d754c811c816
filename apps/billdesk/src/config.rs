//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLDESK_DB_PATH=/srv/shop/billdesk.db                             │
//! │     BILLDESK_TAX_MEDICAL_BPS=500                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/billdesk/billdesk.toml (Linux)                           │
//! │     ~/Library/Application Support/com.billdesk.billdesk/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5% / 1% / 10% tax, 10s store timeout                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/home/asha/.local/share/billdesk/billdesk.db"
//! max_connections = 5
//!
//! [stores]
//! timeout_secs = 10
//! bill_number_attempts = 5
//!
//! [tax]
//! medical_bps = 500
//! grocery_bps = 100
//! drinks_bps = 1000
//!
//! [paths]
//! bills_dir = "/home/asha/.local/share/billdesk/bills"
//!
//! [receipts]
//! format = "pdf"    # or "text"
//!
//! [logging]
//! filter = "info,billdesk=debug,sqlx=warn"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use billdesk_core::tax::{DEFAULT_DRINKS_BPS, DEFAULT_GROCERY_BPS, DEFAULT_MEDICAL_BPS};
use billdesk_core::validation::validate_tax_rate_bps;
use billdesk_core::TaxTable;
use billdesk_db::DbConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::render::ReceiptFormat;

/// Default `tracing` filter when neither the config file nor `RUST_LOG` set one.
pub const DEFAULT_LOG_FILTER: &str = "info,billdesk=debug,sqlx=warn";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available on this platform")]
    NoConfigPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// `[stores]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Upper bound on any single store or identity call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bill number draws before giving up on a collision streak.
    #[serde(default = "default_bill_number_attempts")]
    pub bill_number_attempts: u32,
}

/// `[tax]`, in basis points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSettings {
    #[serde(default = "default_medical_bps")]
    pub medical_bps: u32,

    #[serde(default = "default_grocery_bps")]
    pub grocery_bps: u32,

    #[serde(default = "default_drinks_bps")]
    pub drinks_bps: u32,
}

/// `[paths]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Where rendered receipts are archived.
    #[serde(default = "default_bills_dir")]
    pub bills_dir: PathBuf,
}

/// `[receipts]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    /// Format of archived receipts. The terminal always gets text.
    #[serde(default)]
    pub format: ReceiptFormat,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "billdesk", "billdesk")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_db_path() -> PathBuf {
    data_dir().join("billdesk.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_bill_number_attempts() -> u32 {
    5
}
fn default_medical_bps() -> u32 {
    DEFAULT_MEDICAL_BPS
}
fn default_grocery_bps() -> u32 {
    DEFAULT_GROCERY_BPS
}
fn default_drinks_bps() -> u32 {
    DEFAULT_DRINKS_BPS
}
fn default_bills_dir() -> PathBuf {
    data_dir().join("bills")
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            timeout_secs: default_timeout_secs(),
            bill_number_attempts: default_bill_number_attempts(),
        }
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            medical_bps: default_medical_bps(),
            grocery_bps: default_grocery_bps(),
            drinks_bps: default_drinks_bps(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        PathSettings {
            bills_dir: default_bills_dir(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub stores: StoreSettings,

    #[serde(default)]
    pub tax: TaxSettings,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub receipts: ReceiptSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (billdesk.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file and returns the path written.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml()?)?;

        info!(?path, "Config saved");
        Ok(path)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, bps) in [
            ("tax.medical_bps", self.tax.medical_bps),
            ("tax.grocery_bps", self.tax.grocery_bps),
            ("tax.drinks_bps", self.tax.drinks_bps),
        ] {
            validate_tax_rate_bps(bps)
                .map_err(|_| ConfigError::Invalid(format!("{} must be <= 10000, got {}", name, bps)))?;
        }

        if self.stores.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "stores.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.stores.bill_number_attempts == 0 {
            return Err(ConfigError::Invalid(
                "stores.bill_number_attempts must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `BILLDESK_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BILLDESK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("BILLDESK_BILLS_DIR") {
            self.paths.bills_dir = PathBuf::from(dir);
        }

        if let Some(format) = lookup("BILLDESK_RECEIPT_FORMAT") {
            match format.parse::<ReceiptFormat>() {
                Ok(f) => self.receipts.format = f,
                Err(e) => warn!(error = %e, "Ignoring invalid BILLDESK_RECEIPT_FORMAT"),
            }
        }

        if let Some(secs) = lookup("BILLDESK_STORE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.stores.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid BILLDESK_STORE_TIMEOUT_SECS"),
            }
        }

        for (key, slot) in [
            ("BILLDESK_TAX_MEDICAL_BPS", &mut self.tax.medical_bps),
            ("BILLDESK_TAX_GROCERY_BPS", &mut self.tax.grocery_bps),
            ("BILLDESK_TAX_DRINKS_BPS", &mut self.tax.drinks_bps),
        ] {
            if let Some(value) = lookup(key) {
                match value.parse::<u32>() {
                    Ok(bps) => {
                        debug!(key, bps, "Overriding tax rate from environment");
                        *slot = bps;
                    }
                    Err(_) => warn!(key, value = %value, "Ignoring invalid tax override"),
                }
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("billdesk.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_table(&self) -> ConfigResult<TaxTable> {
        TaxTable::from_bps(self.tax.medical_bps, self.tax.grocery_bps, self.tax.drinks_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.stores.timeout_secs)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}
