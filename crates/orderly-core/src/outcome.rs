//! # Outcomes
//!
//! Failure kinds shared by every operation, and the structured result of an
//! order placement.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  place_order(...)                                                       │
//! │       │                                                                 │
//! │       ├── committed ──► { success: true,  message, orderId, ... }       │
//! │       │                                                                 │
//! │       └── rolled back ─► { success: false, message, kind }              │
//! │                              kind ∈ VALIDATION_ERROR | USER_NOT_FOUND   │
//! │                                   | PRODUCT_NOT_FOUND                   │
//! │                                   | INSUFFICIENT_STOCK                  │
//! │                                   | TRANSACTION_FAULT                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::types::Order;

/// Stable failure classification.
///
/// Serialized codes never change once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Bad caller input; storage was never touched.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    UserNotFound,
    ProductNotFound,
    InsufficientStock,
    /// Unexpected storage failure (or timeout) inside a transaction.
    TransactionFault,
    /// A read operation's backend call failed.
    QueryFault,
}

impl FailureKind {
    /// The machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::Validation => "VALIDATION_ERROR",
            FailureKind::UserNotFound => "USER_NOT_FOUND",
            FailureKind::ProductNotFound => "PRODUCT_NOT_FOUND",
            FailureKind::InsufficientStock => "INSUFFICIENT_STOCK",
            FailureKind::TransactionFault => "TRANSACTION_FAULT",
            FailureKind::QueryFault => "QUERY_FAULT",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of one order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_stock: Option<i64>,
}

impl OrderOutcome {
    /// A committed placement.
    pub fn placed(order: &Order, remaining_stock: i64) -> Self {
        OrderOutcome {
            success: true,
            message: format!(
                "Order {} placed: {} × product {} for user {}",
                order.id, order.quantity, order.product_id, order.user_id
            ),
            kind: None,
            order_id: Some(order.id),
            remaining_stock: Some(remaining_stock),
        }
    }

    /// A rolled-back or never-started placement.
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        OrderOutcome {
            success: false,
            message: message.into(),
            kind: Some(kind),
            order_id: None,
            remaining_stock: None,
        }
    }

    /// Storage fault with the generic caller-facing message.
    pub fn fault() -> Self {
        Self::failed(
            FailureKind::TransactionFault,
            "Order could not be placed due to a storage error",
        )
    }

    /// Whether the placement failed with `kind`.
    pub fn is(&self, kind: FailureKind) -> bool {
        self.kind == Some(kind)
    }
}

impl From<CoreError> for OrderOutcome {
    fn from(err: CoreError) -> Self {
        OrderOutcome::failed(err.kind(), err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_codes_match_serialization() {
        for kind in [
            FailureKind::Validation,
            FailureKind::UserNotFound,
            FailureKind::ProductNotFound,
            FailureKind::InsufficientStock,
            FailureKind::TransactionFault,
            FailureKind::QueryFault,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.code()));
        }
    }

    #[test]
    fn test_failed_outcome_shape() {
        let outcome: OrderOutcome = CoreError::ProductNotFound(9).into();
        assert!(!outcome.success);
        assert!(outcome.is(FailureKind::ProductNotFound));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "message": "Product not found: 9",
                "kind": "PRODUCT_NOT_FOUND"
            })
        );
    }

    #[test]
    fn test_placed_outcome() {
        let order = Order {
            id: 3,
            user_id: 1,
            product_id: 2,
            quantity: 4,
            created_at: Utc::now(),
        };
        let outcome = OrderOutcome::placed(&order, 6);
        assert!(outcome.success);
        assert_eq!(outcome.kind, None);
        assert_eq!(outcome.order_id, Some(3));
        assert_eq!(outcome.remaining_stock, Some(6));
    }
}
