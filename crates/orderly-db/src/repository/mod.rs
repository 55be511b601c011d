//! # Repository Module
//!
//! Database repository implementations for Orderly.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Transport handler                                                     │
//! │       │                                                                 │
//! │       │  db.users().list(PageRequest::new(2, 5)?)                      │
//! │       ▼                                                                 │
//! │  UserRepository                                                        │
//! │  ├── insert(&self, new_user)                                           │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── list(&self, page)  ──► count query + window query                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - User inserts, lookups, listing
//! - [`ProductRepository`](product::ProductRepository) - Product inserts, lookups, listing
//! - [`OrderRepository`](order::OrderRepository) - Read-only order access
//! - [`AnalyticsRepository`](analytics::AnalyticsRepository) - Joined and aggregated queries

pub mod analytics;
pub mod order;
pub mod product;
pub mod user;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

use crate::error::DbResult;
use orderly_core::{Page, PageRequest};

/// Runs a window query and its count query, returning the envelope.
///
/// `data_sql` must end with `LIMIT ? OFFSET ?` and take no other binds;
/// `count_sql` must select a single `COUNT(*)` over the same rows.
pub(crate) async fn fetch_page<T>(
    pool: &SqlitePool,
    data_sql: &str,
    count_sql: &str,
    request: PageRequest,
) -> DbResult<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let total: i64 = sqlx::query_scalar(count_sql).fetch_one(pool).await?;

    let rows: Vec<T> = sqlx::query_as(data_sql)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(rows, total, request))
}
