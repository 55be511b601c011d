//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Inserts and lookups
//! - Paginated listing
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes products.stock                            │
//! │                                                                         │
//! │  ProductRepository::insert      ──► initial stock (>= 0)               │
//! │                                                                         │
//! │  OrderManager::place_order      ──► stock = stock - quantity           │
//! │       (inside the placement transaction, guarded by stock >= qty)      │
//! │                                                                         │
//! │  Everything else                ──► read only                          │
//! │                                                                         │
//! │  CHECK (stock >= 0) backs the guard at the schema level.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::fetch_page;
use orderly_core::validation::validate_new_product;
use orderly_core::{NewProduct, Page, PageRequest, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let lamp = repo.insert(&NewProduct::new("Lamp", Money::from_major_minor(25, 0), 10)).await?;
/// let page = repo.list(PageRequest::new(1, 50)?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product with its initial stock.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;

        let name = product.name.trim();
        debug!(name = %name, price_cents = product.price_cents, stock = product.stock, "Inserting product");

        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price_cents, stock, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, price_cents, stock, created_at
            "#,
        )
        .bind(name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Gets a product by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        debug!(id = id, "Getting product by id");

        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price_cents, stock, created_at FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by id.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<Product>> {
        debug!(page = page.page(), page_size = page.page_size(), "Listing products");

        fetch_page(
            &self.pool,
            r#"
            SELECT id, name, price_cents, stock, created_at
            FROM products
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
            "SELECT COUNT(*) FROM products",
            page,
        )
        .await
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use orderly_core::Money;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let product = db
            .products()
            .insert(&NewProduct::new("Desk Lamp", Money::from_major_minor(24, 99), 7))
            .await
            .unwrap();

        assert_eq!(product.price_cents, 2499);
        assert_eq!(product.stock, 7);

        let found = db.products().get_by_id(product.id).await.unwrap();
        assert_eq!(found, Some(product));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_negative_values_rejected() {
        let db = setup().await;

        let err = db
            .products()
            .insert(&NewProduct::new("Broken", Money::from_cents(-1), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = db
            .products()
            .insert(&NewProduct::new("Broken", Money::zero(), -1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_schema_rejects_negative_stock() {
        let db = setup().await;
        let product = db
            .products()
            .insert(&NewProduct::new("Mug", Money::from_major_minor(8, 0), 1))
            .await
            .unwrap();

        let err: DbError = sqlx::query("UPDATE products SET stock = -1 WHERE id = ?1")
            .bind(product.id)
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_by_id() {
        let db = setup().await;
        for name in ["Alpha", "Beta", "Gamma"] {
            db.products()
                .insert(&NewProduct::new(name, Money::from_major_minor(1, 0), 1))
                .await
                .unwrap();
        }

        let page = db.products().list(PageRequest::new(1, 2).unwrap()).await.unwrap();
        let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta"]);
        assert_eq!(page.metadata.total_records, 3);
        assert_eq!(page.metadata.total_pages, 2);
    }
}
