//! # Error Types
//!
//! Domain-specific error types for orderly-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderly-core errors (this file)                                       │
//! │  ├── CoreError        - Order placement rejections                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  orderly-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → OrderOutcome / Failure → caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::outcome::FailureKind;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected while placing an order.
///
/// Every variant causes the surrounding transaction to roll back.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product row exists for the id at lock time.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// No user row exists for the id referenced by the order.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Requested quantity exceeds the locked stock value.
    ///
    /// ## User Workflow
    /// ```text
    /// place_order(qty: 5)
    ///      │
    ///      ▼
    /// Lock product row: stock=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// ROLLBACK, caller sees "only 3 in stock"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps the rejection to its stable failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            CoreError::ProductNotFound(_) => FailureKind::ProductNotFound,
            CoreError::UserNotFound(_) => FailureKind::UserNotFound,
            CoreError::InsufficientStock { .. } => FailureKind::InsufficientStock,
            CoreError::Validation(_) => FailureKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any storage call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Unit Tests
// =============================================================================
