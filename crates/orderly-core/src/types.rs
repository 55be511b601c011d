//! # Domain Types
//!
//! Rows of the three-table schema and the shapes returned by the analytical
//! queries.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Product     │   │      Order      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──┤                 │   │  id             │       │
//! │  │  name           │   │  id             │◄──┤  product_id     │       │
//! │  │  email (unique) │   │  name           │   │  user_id ───────┼──►    │
//! │  └─────────────────┘   │  price_cents≥0  │   │  quantity > 0   │       │
//! │                        │  stock ≥ 0      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  Analytical rows: UserProductPair, UserSpend, TopProduct               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders refer to users and products by id only. They are written once by
//! the order transaction manager and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// User
// =============================================================================

/// A customer who can place orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique across all users.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user; the id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewUser {
            name: name.into(),
            email: email.into(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product with a price and a stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Unit price in cents, never negative.
    pub price_cents: i64,
    /// Units on hand, never negative.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Fields required to create a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Money, stock: i64) -> Self {
        NewProduct {
            name: name.into(),
            price_cents: price.cents(),
            stock,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A recorded purchase. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Analytical Rows
// =============================================================================

/// One cell of the users × products combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserProductPair {
    pub user_name: String,
    pub product_name: String,
    pub price_cents: i64,
}

impl UserProductPair {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A user's lifetime spend (`Σ quantity × price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserSpend {
    pub user_id: i64,
    pub user_name: String,
    pub total_spent_cents: i64,
}

impl UserSpend {
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

/// The highest-ranked product for one user.
///
/// Ranking: `total_qty` desc, then `total_value_cents` desc, then
/// `product_id` asc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub user_id: i64,
    pub user_name: String,
    pub product_id: i64,
    pub top_product: String,
    pub total_qty: i64,
    pub total_value_cents: i64,
}

impl TopProduct {
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_cents(self.total_value_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_price() {
        let product = Product {
            id: 1,
            name: "Widget".to_string(),
            price_cents: 1000,
            stock: 5,
            created_at: Utc::now(),
        };
        assert_eq!(product.price(), Money::from_major_minor(10, 0));
    }

    #[test]
    fn test_new_product_stores_cents() {
        let product = NewProduct::new("Lamp", Money::from_major_minor(12, 50), 3);
        assert_eq!(product.price_cents, 1250);
    }
}
