//! # Order Transaction Manager
//!
//! The only writer of orders and of product stock after creation. One call
//! to [`OrderManager::place_order`] is one transaction: the order row and
//! the stock decrement commit together or not at all.
//!
//! ## Placement Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order(user, product, qty)                      │
//! │                                                                         │
//! │  0. validate ids > 0, qty > 0 ──────────────► VALIDATION_ERROR          │
//! │       │                      (storage never touched)                    │
//! │       ▼                                                                 │
//! │  ┌──────────────── transaction_timeout ─────────────────────────────┐  │
//! │  │ 1. BEGIN (pooled connection owned by the Transaction)            │  │
//! │  │ 2. UPDATE products SET stock = stock WHERE id = ? RETURNING stock│  │
//! │  │      takes the write lock; other placements wait here            │  │
//! │  │      no row ──────────────────────────────► PRODUCT_NOT_FOUND    │  │
//! │  │ 3. user exists? ──────── no ──────────────► USER_NOT_FOUND       │  │
//! │  │    stock >= qty? ─────── no ──────────────► INSUFFICIENT_STOCK   │  │
//! │  │ 4. UPDATE ... stock = stock - qty WHERE stock >= qty             │  │
//! │  │ 5. INSERT INTO orders ... RETURNING id                           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ├── any failure in 2..5 ──► ROLLBACK ──► outcome with kind        │
//! │       ├── storage error ────────────────────► TRANSACTION_FAULT         │
//! │       ├── timeout ─── future dropped, sqlx rolls back on reuse          │
//! │       │                                      ► TRANSACTION_FAULT        │
//! │       ▼                                                                 │
//! │  6. COMMIT (not timed) ─── error ───────────► TRANSACTION_FAULT         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantee
//! For a fixed product, final stock equals initial stock minus the sum of
//! successful quantities and never goes negative. Two placements against
//! the same product are totally ordered by the lock taken in step 2.
//!
//! A timeout can only fire before COMMIT is issued, so an outcome reported
//! as `TRANSACTION_FAULT` never leaves an order behind.
//!
//! ## Write Lock Scope
//! SQLite has one write lock per database, not per product. A placement
//! waits up to `lock_timeout` for any other writer, whichever product that
//! writer touches. Past that it fails with `TRANSACTION_FAULT` and changes
//! nothing. Placements on different products never change each other's
//! stock, but they do queue behind each other.

use std::time::Duration;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, error, info, warn};

use crate::error::DbError;
use orderly_core::validation::{validate_id, validate_quantity};
use orderly_core::{CoreError, FailureKind, Order, OrderOutcome, ValidationError};

/// Why a placement transaction did not commit.
#[derive(Debug)]
enum PlacementError {
    /// The request cannot be satisfied by the current data.
    Rejected(CoreError),
    /// The backend failed.
    Storage(DbError),
}

impl From<CoreError> for PlacementError {
    fn from(err: CoreError) -> Self {
        PlacementError::Rejected(err)
    }
}

impl From<sqlx::Error> for PlacementError {
    fn from(err: sqlx::Error) -> Self {
        PlacementError::Storage(err.into())
    }
}

/// Result of steps 2..5, valid once the transaction commits.
struct Placed {
    order: Order,
    remaining_stock: i64,
}

/// Transactional order placement.
///
/// ## Usage
/// ```rust,ignore
/// let manager = db.order_manager();
///
/// let outcome = manager.place_order(user_id, product_id, 3).await;
/// if outcome.is(FailureKind::InsufficientStock) {
///     // tell the customer
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OrderManager {
    pool: SqlitePool,
    transaction_timeout: Duration,
}

impl OrderManager {
    /// Creates a new OrderManager.
    pub fn new(pool: SqlitePool, transaction_timeout: Duration) -> Self {
        OrderManager {
            pool,
            transaction_timeout,
        }
    }

    /// Places one order, atomically decrementing the product's stock.
    ///
    /// Never returns an error or panics: every failure is reported through
    /// [`OrderOutcome::kind`].
    pub async fn place_order(&self, user_id: i64, product_id: i64, quantity: i64) -> OrderOutcome {
        if let Err(err) = validate_request(user_id, product_id, quantity) {
            warn!(user_id, product_id, quantity, error = %err, "Order request rejected");
            return CoreError::Validation(err).into();
        }

        debug!(user_id, product_id, quantity, "Placing order");

        let staged = tokio::time::timeout(
            self.transaction_timeout,
            self.stage(user_id, product_id, quantity),
        )
        .await;

        let (tx, placed) = match staged {
            Ok(Ok(staged)) => staged,
            Ok(Err(PlacementError::Rejected(err))) => {
                warn!(user_id, product_id, quantity, kind = %err.kind(), "Order rejected: {}", err);
                return err.into();
            }
            Ok(Err(PlacementError::Storage(err))) => {
                error!(user_id, product_id, quantity, error = %err, "Order placement failed");
                return OrderOutcome::fault();
            }
            Err(_) => {
                error!(
                    user_id,
                    product_id,
                    quantity,
                    timeout_ms = self.transaction_timeout.as_millis() as u64,
                    "Order placement timed out"
                );
                return OrderOutcome::failed(
                    FailureKind::TransactionFault,
                    format!(
                        "Order placement timed out after {} ms",
                        self.transaction_timeout.as_millis()
                    ),
                );
            }
        };

        // Untimed: once COMMIT is issued the outcome follows its result
        if let Err(err) = tx.commit().await {
            let err = DbError::from(err);
            error!(user_id, product_id, quantity, error = %err, "Order commit failed");
            return OrderOutcome::fault();
        }

        info!(
            order_id = placed.order.id,
            user_id,
            product_id,
            quantity,
            remaining_stock = placed.remaining_stock,
            "Order placed"
        );
        OrderOutcome::placed(&placed.order, placed.remaining_stock)
    }

    /// Steps 1..5: begin and apply, leaving the transaction open for commit.
    /// On failure the transaction is rolled back before returning.
    async fn stage(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<(Transaction<'static, Sqlite>, Placed), PlacementError> {
        let mut tx = self.pool.begin().await?;

        match apply(&mut tx, user_id, product_id, quantity).await {
            Ok(placed) => Ok((tx, placed)),
            Err(err) => {
                // Logged only; the caller sees the original failure
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn validate_request(user_id: i64, product_id: i64, quantity: i64) -> Result<(), ValidationError> {
    validate_id("user_id", user_id)?;
    validate_id("product_id", product_id)?;
    validate_quantity(quantity)
}

/// Steps 2..5 inside an open transaction.
async fn apply(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> Result<Placed, PlacementError> {
    // Lock & read: a write as the first statement takes the database write
    // lock before anything is read.
    let stock: Option<i64> =
        sqlx::query_scalar("UPDATE products SET stock = stock WHERE id = ?1 RETURNING stock")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;
    let stock = stock.ok_or(CoreError::ProductNotFound(product_id))?;

    let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    if user.is_none() {
        return Err(CoreError::UserNotFound(user_id).into());
    }

    let insufficient = CoreError::InsufficientStock {
        product_id,
        available: stock,
        requested: quantity,
    };
    if stock < quantity {
        return Err(insufficient.into());
    }

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock - ?1
        WHERE id = ?2 AND stock >= ?1
        RETURNING stock
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;
    let remaining_stock = remaining.ok_or(insufficient)?;

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (user_id, product_id, quantity, created_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, user_id, product_id, quantity, created_at
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(chrono::Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(Placed {
        order,
        remaining_stock,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
