//! # orderly-db: Storage Layer for Orderly
//!
//! This crate provides database access for Orderly: the three-table schema,
//! paginated listings, the analytical query engine and the order
//! transaction manager. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderly Data Flow                                │
//! │                                                                         │
//! │  Transport handler (placeOrder, topProductPerUser, ...)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   orderly-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌────────────────┐  ┌─────────────────┐   │   │
//! │  │   │   Database    │  │  Repositories  │  │  OrderManager   │   │   │
//! │  │   │   (pool.rs)   │  │ users/products │  │  place_order    │   │   │
//! │  │   │               │◄─│ orders         │  │  lock → check → │   │   │
//! │  │   │ SqlitePool    │  │ analytics      │  │  mutate → commit│   │   │
//! │  │   └───────────────┘  └────────────────┘  └─────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   Migrations: migrations/sqlite/001_initial_schema.sql         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and the boundary `Failure`
//! - [`repository`] - Repository implementations (users, products, orders, analytics)
//! - [`order_manager`] - Transactional order placement
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderly_db::{Database, DbConfig};
//! use orderly_core::PageRequest;
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let outcome = db.order_manager().place_order(user_id, product_id, 2).await;
//! let top = db.analytics().top_product_per_user(PageRequest::new(1, 50)?).await?;
//!
//! db.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod order_manager;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ConfigError;
pub use error::{DbError, DbResult, Failure};
pub use order_manager::OrderManager;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::analytics::AnalyticsRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
