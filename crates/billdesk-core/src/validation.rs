//! # Validation Module
//!
//! Input validation for the billing flow.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI (clap)                                                   │
//! │  ├── Argument shape (`--item med_1=2`)                                 │
//! │  └── THIS MODULE: parse_item_arg                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Composition / Ledger                                         │
//! │  └── THIS MODULE: customer fields, quantities, patches                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── PRIMARY KEY on bill_no / product_id                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 32;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Customer Fields
// =============================================================================

/// Validates the customer name printed on a bill.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use billdesk_core::validation::validate_customer_name;
///
/// assert!(validate_customer_name("Ravi Kumar").is_ok());
/// assert!(validate_customer_name("   ").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("customer_name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates the customer phone.
///
/// Only emptiness and length are checked; shops enter local formats with
/// spaces, dashes and country prefixes.
pub fn validate_customer_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required("customer_phone"));
    }

    if phone.chars().count() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Account Fields
// =============================================================================

/// Validates a sign-up or sign-in email address.
///
/// Only the shape `local@domain` is checked. Deliverability is what the
/// verification step is for.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: format!("'{}' is not an email address", email),
        }),
    }
}

/// Validates a new password (at least 6 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity typed by the cashier.
///
/// ## Rules
/// - Zero is accepted (an explicitly cleared selection)
/// - Negative values are rejected
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed.
pub fn validate_price_minor(minor: i64) -> ValidationResult<()> {
    if minor < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Argument Parsing
// =============================================================================

/// Parses a `product_id=quantity` selection argument.
///
/// ## Example
/// ```rust
/// use billdesk_core::validation::parse_item_arg;
///
/// assert_eq!(parse_item_arg("med_1=2").unwrap(), ("med_1".to_string(), 2));
/// assert!(parse_item_arg("med_1").is_err());
/// ```
pub fn parse_item_arg(arg: &str) -> ValidationResult<(String, i64)> {
    let (id, qty) = arg.split_once('=').ok_or_else(|| ValidationError::InvalidFormat {
        field: "item".to_string(),
        reason: format!("expected product_id=quantity, got '{}'", arg),
    })?;

    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::required("product_id"));
    }

    let qty: i64 = qty.trim().parse().map_err(|_| ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: format!("'{}' is not a whole number", qty.trim()),
    })?;
    validate_quantity(qty)?;

    Ok((id.to_string(), qty))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Ravi").is_ok());
        assert!(matches!(
            validate_customer_name(""),
            Err(ValidationError::Required { field }) if field == "customer_name"
        ));
        assert!(validate_customer_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_customer_phone() {
        assert!(validate_customer_phone("+91 98765 43210").is_ok());
        assert!(validate_customer_phone("  ").is_err());
        assert!(validate_customer_phone(&"9".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@corner-shop.in").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("@shop.in").is_err());
        assert!(validate_email("asha@localhost").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(matches!(
            validate_password(""),
            Err(ValidationError::Required { field }) if field == "password"
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_parse_item_arg() {
        assert_eq!(parse_item_arg(" gro_2 = 3 ").unwrap(), ("gro_2".to_string(), 3));
        assert!(parse_item_arg("=3").is_err());
        assert!(parse_item_arg("gro_2=abc").is_err());
        assert!(parse_item_arg("gro_2=-4").is_err());
    }
}
