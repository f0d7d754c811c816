//! # Error Types
//!
//! Domain-specific error types for billdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Record decoding and domain failures            │
//! │  └── ValidationError  - Bad caller input                               │
//! │                                                                         │
//! │  billdesk-db errors (separate crate)                                   │
//! │  └── StoreError       - Catalog/ledger/user store failures             │
//! │                                                                         │
//! │  billdesk app errors                                                   │
//! │  ├── IdentityError    - Credential and verification failures           │
//! │  └── AppError         - What the CLI prints (code + message)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → AppError → User      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `ValidationError` is always recoverable by the person at the counter.
//! It is shown to them verbatim and never logged as a fault.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A persisted bill document could not be turned back into a `Bill`.
    ///
    /// ## When This Occurs
    /// - `total` of an item disagrees with `price × quantity`
    /// - Category totals or `total_amount` disagree with the items
    /// - Timestamp is not ISO-8601
    #[error("Invalid bill record {bill_no}: {reason}")]
    InvalidRecord { bill_no: String, reason: String },

    /// A category string that none of the known categories match.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// No selection survived filtering (all zero, or all unknown products).
    #[error("no products selected")]
    NoItemsSelected,

    /// A partial update carried no fields.
    #[error("no update fields provided")]
    NoUpdateFields,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// An amount left the range a bill can hold.
    #[error("{field} is too large")]
    AmountOverflow { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. `med_1=abc` on the command line).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn overflow(field: &str) -> Self {
        ValidationError::AmountOverflow {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("customer_name").to_string(),
            "customer_name is required"
        );
        assert_eq!(
            ValidationError::NoItemsSelected.to_string(),
            "no products selected"
        );
        assert_eq!(
            ValidationError::NoUpdateFields.to_string(),
            "no update fields provided"
        );
    }

    #[test]
    fn test_record_error_message() {
        let err = CoreError::InvalidRecord {
            bill_no: "48213".to_string(),
            reason: "total_amount mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid bill record 48213: total_amount mismatch"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::NoItemsSelected.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
