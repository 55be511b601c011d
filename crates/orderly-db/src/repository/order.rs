//! # Order Repository
//!
//! Read-only access to recorded orders. Rows are written exclusively by
//! [`OrderManager`](crate::order_manager::OrderManager).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::fetch_page;
use orderly_core::{Order, Page, PageRequest};

/// Repository for order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, product_id, quantity, created_at FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders ordered by id.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<Order>> {
        debug!(page = page.page(), page_size = page.page_size(), "Listing orders");

        fetch_page(
            &self.pool,
            r#"
            SELECT id, user_id, product_id, quantity, created_at
            FROM orders
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
            "SELECT COUNT(*) FROM orders",
            page,
        )
        .await
    }

    /// Counts all orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use orderly_core::{Money, NewProduct, NewUser};

    #[tokio::test]
    async fn test_lists_placed_orders() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .insert(&NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        let product = db
            .products()
            .insert(&NewProduct::new("Mug", Money::from_major_minor(8, 0), 10))
            .await
            .unwrap();

        let manager = db.order_manager();
        for qty in [1, 2, 3] {
            assert!(manager.place_order(user.id, product.id, qty).await.success);
        }

        let page = db.orders().list(PageRequest::new(1, 2).unwrap()).await.unwrap();
        let quantities: Vec<_> = page.data.iter().map(|o| o.quantity).collect();
        assert_eq!(quantities, [1, 2]);
        assert_eq!(page.metadata.total_records, 3);
        assert_eq!(page.metadata.total_pages, 2);

        let first = db.orders().get_by_id(page.data[0].id).await.unwrap().unwrap();
        assert_eq!(first.user_id, user.id);
        assert_eq!(first.product_id, product.id);
        assert_eq!(db.orders().count().await.unwrap(), 3);
        assert!(db.orders().get_by_id(9999).await.unwrap().is_none());
    }
}
