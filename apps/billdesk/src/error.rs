//! # Application Error Type
//!
//! Unified error type for billdesk commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  ValidationError ──┐                                                   │
//! │  CoreError ────────┤                                                   │
//! │  StoreError ───────┼──► AppError { code, message } ──► CLI stderr      │
//! │  IdentityError ────┤         │                         + exit code     │
//! │  ConfigError ──────┘         │                                          │
//! │                              └── store/internal causes logged with     │
//! │                                  tracing::error!, validation never     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billdesk_core::{CoreError, ValidationError};
use billdesk_db::StoreError;
use serde::Serialize;

use crate::config::ConfigError;
use crate::identity::IdentityError;
use crate::render::RenderError;

/// Error returned from billdesk commands.
///
/// ## Serialization
/// With `--json`, this is what a failing command prints:
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "no products selected"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Store operation failed
    StoreError,

    /// A store or identity call ran out of time; safe to retry reads
    Timeout,

    /// Credentials rejected
    AuthFailed,

    /// Account exists but email is not verified yet
    EmailNotVerified,

    /// Configuration could not be loaded
    ConfigError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::AuthFailed | ErrorCode::EmailNotVerified => 4,
            ErrorCode::Timeout => 5,
            ErrorCode::StoreError | ErrorCode::ConfigError | ErrorCode::Internal => 1,
        }
    }
}

impl AppError {
    /// Creates a new application error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::UnknownCategory(c) => {
                AppError::validation(format!("Unknown category: {}", c))
            }
            CoreError::InvalidRecord { bill_no, reason } => {
                tracing::error!(bill_no = %bill_no, "Invalid bill record: {}", reason);
                AppError::new(
                    ErrorCode::StoreError,
                    format!("Bill {} is damaged and cannot be read", bill_no),
                )
            }
        }
    }
}

/// Converts store errors, keeping the cause in the message.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            StoreError::UniqueViolation { field, value } => AppError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            StoreError::Validation(e) => e.into(),
            StoreError::Timeout { .. } => {
                tracing::error!("{}", err);
                AppError::new(ErrorCode::Timeout, err.to_string())
            }
            StoreError::BillNumberExhausted { .. } => {
                tracing::error!("{}", err);
                AppError::new(ErrorCode::StoreError, err.to_string())
            }
            StoreError::Corrupt { .. } => {
                tracing::error!("{}", err);
                AppError::new(ErrorCode::StoreError, err.to_string())
            }
            StoreError::ConnectionFailed(_)
            | StoreError::MigrationFailed(_)
            | StoreError::QueryFailed(_)
            | StoreError::TransactionFailed(_)
            | StoreError::PoolExhausted
            | StoreError::Internal(_) => {
                tracing::error!("Store operation failed: {}", err);
                AppError::new(ErrorCode::StoreError, err.to_string())
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken(_) => AppError::validation(err.to_string()),
            IdentityError::InvalidCredentials
            | IdentityError::InvalidToken
            | IdentityError::NotSignedIn => AppError::new(ErrorCode::AuthFailed, err.to_string()),
            IdentityError::EmailNotVerified { .. } => {
                AppError::new(ErrorCode::EmailNotVerified, err.to_string())
            }
            IdentityError::Validation(e) => e.into(),
            IdentityError::Store(e) => e.into(),
            IdentityError::Hashing(msg) => {
                tracing::error!("Password hashing failed: {}", msg);
                AppError::internal("Password hashing failed")
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        tracing::error!("Receipt error: {}", err);
        AppError::internal(err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_validation_code() {
        let err: AppError = ValidationError::NoUpdateFields.into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "no update fields provided");
    }

    #[test]
    fn test_store_timeout_maps_to_timeout_code() {
        let err: AppError = StoreError::Timeout {
            operation: "ledger.get".to_string(),
            secs: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::Timeout);
        assert!(err.message.contains("ledger.get"));
    }

    #[test]
    fn test_store_validation_keeps_its_message() {
        let err: AppError = StoreError::Validation(ValidationError::NoUpdateFields).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "no update fields provided");
    }

    #[test]
    fn test_unverified_email_is_distinct() {
        let err: AppError = IdentityError::EmailNotVerified {
            email: "a@b.c".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::EmailNotVerified);
        assert_ne!(err.code.exit_code(), ErrorCode::ValidationError.exit_code());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&AppError::not_found("Bill", "10001")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Bill not found: 10001"}"#);
    }
}
