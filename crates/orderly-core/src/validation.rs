//! # Validation Module
//!
//! Input checks applied at the boundary, before any storage call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (HTTP / CLI)                                       │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── quantity > 0, ids > 0, names, emails, prices, thresholds          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  ├── UNIQUE (email)                                                    │
//! │  └── FOREIGN KEY (user_id, product_id)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, NewUser};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order quantity.
///
/// ## Example
/// ```rust
/// use orderly_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a surrogate key supplied by a caller.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
///
/// ## Example
/// ```rust
/// use orderly_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an initial stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a spend threshold.
pub fn validate_threshold(threshold: Money) -> ValidationResult<()> {
    if threshold.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "threshold".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a user or product display name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape `local@domain.tld` is checked.
///
/// ## Example
/// ```rust
/// use orderly_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada@localhost").is_err());
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid("must look like name@domain.tld"));
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid("domain must contain a '.'")),
    }
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates all fields of a new user.
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_name("name", &user.name)?;
    validate_email(&user.email)
}

/// Validates all fields of a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_price_cents(product.price_cents)?;
    validate_stock(product.stock)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("user_id", 1).is_ok());
        let err = validate_id("user_id", 0).unwrap_err();
        assert_eq!(err.to_string(), "user_id must be positive");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Ada Lovelace").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.io").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@b.io").is_err());
        assert!(validate_email("a@@b.io").is_err());
        assert!(validate_email("a b@c.io").is_err());
        assert!(validate_email("a@.io").is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(Money::zero()).is_ok());
        assert!(validate_threshold(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        assert!(validate_new_product(&NewProduct::new("Mug", Money::from_cents(450), 0)).is_ok());
        assert!(validate_new_product(&NewProduct::new("Mug", Money::from_cents(-1), 0)).is_err());
        assert!(validate_new_product(&NewProduct::new("Mug", Money::from_cents(1), -1)).is_err());
    }
}
