//! # Analytics Repository
//!
//! Read-only joined and aggregated queries over users, products and orders.
//! Every query is paginated and returns the `{data, metadata}` envelope.
//!
//! ## Query Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Analytical Queries                                   │
//! │                                                                         │
//! │  cross_combination                                                     │
//! │    users u CROSS JOIN products p                                       │
//! │    [WHERE <compiled predicate, ? placeholders only>]                   │
//! │    ORDER BY u.id, p.id                                                 │
//! │                                                                         │
//! │  users_above_threshold                                                 │
//! │    orders ⋈ users ⋈ products                                           │
//! │    GROUP BY user  HAVING Σ(qty × price) > threshold                    │
//! │    ORDER BY total DESC, user id ASC                                    │
//! │                                                                         │
//! │  top_product_per_user                                                  │
//! │    per (user, product): Σ qty, Σ value                                 │
//! │    ROW_NUMBER() OVER (PARTITION BY user                                │
//! │        ORDER BY qty DESC, value DESC, product id ASC) = 1              │
//! │    ORDER BY user id                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Counts
//! Each data query has a count query built from the same `FROM ... WHERE`
//! (or grouped subquery) fragment, so `totalRecords` always describes the
//! rows the window is cut from. The two statements run separately; under
//! concurrent order placement they may observe different commits.

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use orderly_core::validation::validate_threshold;
use orderly_core::{
    CompiledPredicate, FilterValue, Money, Page, PageRequest, Predicate, TopProduct, UserProductPair,
    UserSpend,
};

/// Users joined to orders and products, one row per user, with its spend.
/// Takes the threshold as its only bind.
const SPEND_BY_USER: &str = r#"
    SELECT u.id AS user_id,
           u.name AS user_name,
           SUM(o.quantity * p.price_cents) AS total_spent_cents
    FROM orders o
    JOIN users u ON u.id = o.user_id
    JOIN products p ON p.id = o.product_id
    GROUP BY u.id, u.name
    HAVING SUM(o.quantity * p.price_cents) > ?
"#;

/// One row per ordering user: the winning `ranked` row.
const TOP_PRODUCT_PER_USER: &str = r#"
    WITH per_product AS (
        SELECT o.user_id,
               o.product_id,
               SUM(o.quantity) AS total_qty,
               SUM(o.quantity * p.price_cents) AS total_value_cents
        FROM orders o
        JOIN products p ON p.id = o.product_id
        GROUP BY o.user_id, o.product_id
    ),
    ranked AS (
        SELECT pp.user_id,
               pp.product_id,
               pp.total_qty,
               pp.total_value_cents,
               ROW_NUMBER() OVER (
                   PARTITION BY pp.user_id
                   ORDER BY pp.total_qty DESC, pp.total_value_cents DESC, pp.product_id ASC
               ) AS rn
        FROM per_product pp
    )
    SELECT r.user_id,
           u.name AS user_name,
           r.product_id,
           p.name AS top_product,
           r.total_qty,
           r.total_value_cents
    FROM ranked r
    JOIN users u ON u.id = r.user_id
    JOIN products p ON p.id = r.product_id
    WHERE r.rn = 1
"#;

/// Repository for analytical queries.
///
/// ## Usage
/// ```rust,ignore
/// let analytics = db.analytics();
///
/// let cheap = Predicate::compare(Column::PriceCents, Operator::Lt, 1000);
/// let pairs = analytics.cross_combination(Some(&cheap), PageRequest::new(1, 100)?).await?;
///
/// let big_spenders = analytics
///     .users_above_threshold(DEFAULT_SPEND_THRESHOLD, PageRequest::first(20)?)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    /// Creates a new AnalyticsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    /// Every user paired with every product, optionally narrowed by `filter`.
    ///
    /// ## Returns
    /// * `Ok(Page<UserProductPair>)` - Rows ordered by user id, then product id
    /// * `Err(DbError::Validation)` - The predicate failed to compile
    pub async fn cross_combination(
        &self,
        filter: Option<&Predicate>,
        page: PageRequest,
    ) -> DbResult<Page<UserProductPair>> {
        let compiled = filter.map(Predicate::compile).transpose()?;

        let from = match &compiled {
            Some(predicate) => format!("FROM users u CROSS JOIN products p WHERE {}", predicate.sql),
            None => "FROM users u CROSS JOIN products p".to_string(),
        };

        debug!(
            page = page.page(),
            page_size = page.page_size(),
            filtered = compiled.is_some(),
            "Querying user/product combinations"
        );

        let count_sql = format!("SELECT COUNT(*) {from}");
        let total: i64 = bind_scalar(sqlx::query_scalar(&count_sql), compiled.as_ref())
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT u.name AS user_name, p.name AS product_name, p.price_cents AS price_cents \
             {from} ORDER BY u.id, p.id LIMIT ? OFFSET ?"
        );
        let rows = bind_rows(sqlx::query_as::<_, UserProductPair>(&data_sql), compiled.as_ref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, page))
    }

    /// Users whose lifetime spend is strictly greater than `threshold`.
    ///
    /// Ordered by total spend descending, ties broken by user id.
    pub async fn users_above_threshold(
        &self,
        threshold: Money,
        page: PageRequest,
    ) -> DbResult<Page<UserSpend>> {
        validate_threshold(threshold)?;

        debug!(
            threshold_cents = threshold.cents(),
            page = page.page(),
            page_size = page.page_size(),
            "Querying users above spend threshold"
        );

        let count_sql = format!("SELECT COUNT(*) FROM ({SPEND_BY_USER})");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(threshold.cents())
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "{SPEND_BY_USER} ORDER BY total_spent_cents DESC, user_id ASC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, UserSpend>(&data_sql)
            .bind(threshold.cents())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, page))
    }

    /// Each ordering user's most purchased product.
    ///
    /// ## Ranking
    /// 1. Highest total quantity
    /// 2. Then highest total value
    /// 3. Then lowest product id
    ///
    /// Users without orders produce no row.
    pub async fn top_product_per_user(&self, page: PageRequest) -> DbResult<Page<TopProduct>> {
        debug!(page = page.page(), page_size = page.page_size(), "Querying top product per user");

        let count_sql = format!("SELECT COUNT(*) FROM ({TOP_PRODUCT_PER_USER})");
        let total: i64 = sqlx::query_scalar(&count_sql).fetch_one(&self.pool).await?;

        let data_sql = format!("{TOP_PRODUCT_PER_USER} ORDER BY user_id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, TopProduct>(&data_sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, page))
    }
}

// =============================================================================
// Predicate Binding
// =============================================================================

fn bind_rows<'q, T>(
    mut query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    predicate: Option<&'q CompiledPredicate>,
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    for value in predicate.map(|p| p.binds.as_slice()).unwrap_or_default() {
        query = match value {
            FilterValue::Integer(v) => query.bind(*v),
            FilterValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    predicate: Option<&'q CompiledPredicate>,
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in predicate.map(|p| p.binds.as_slice()).unwrap_or_default() {
        query = match value {
            FilterValue::Integer(v) => query.bind(*v),
            FilterValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dollars, memory_db, product, user};
    use crate::{Database, DbError, Failure};
    use orderly_core::{Column, FailureKind, Operator};

    async fn place(db: &Database, user_id: i64, product_id: i64, quantity: i64) {
        let outcome = db.order_manager().place_order(user_id, product_id, quantity).await;
        assert!(outcome.success, "{}", outcome.message);
    }

    // -------------------------------------------------------------------------
    // cross_combination
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cross_combination_is_full_product() {
        let db = memory_db().await;
        for name in ["Ada", "Grace"] {
            user(&db, name).await;
        }
        for (name, price) in [("Mug", 8), ("Lamp", 25), ("Desk", 120)] {
            product(&db, name, dollars(price), 1).await;
        }

        let page = db
            .analytics()
            .cross_combination(None, PageRequest::new(1, 4).unwrap())
            .await
            .unwrap();

        assert_eq!(page.metadata.total_records, 6);
        assert_eq!(page.metadata.total_pages, 2);
        let rows: Vec<_> = page
            .data
            .iter()
            .map(|r| (r.user_name.as_str(), r.product_name.as_str()))
            .collect();
        assert_eq!(
            rows,
            [("Ada", "Mug"), ("Ada", "Lamp"), ("Ada", "Desk"), ("Grace", "Mug")]
        );
    }

    #[tokio::test]
    async fn test_cross_combination_filtered_count_matches_rows() {
        let db = memory_db().await;
        for name in ["Ada", "Grace", "Alan"] {
            user(&db, name).await;
        }
        for (name, price) in [("Mug", 8), ("Lamp", 25), ("Desk", 120)] {
            product(&db, name, dollars(price), 1).await;
        }

        let filter = Predicate::compare(Column::UserName, Operator::StartsWith, "A")
            .and(Predicate::compare(Column::PriceCents, Operator::Ge, 2500));

        let page = db
            .analytics()
            .cross_combination(Some(&filter), PageRequest::new(1, 100).unwrap())
            .await
            .unwrap();

        assert_eq!(page.metadata.total_records, 4);
        assert_eq!(page.data.len(), 4);
        assert!(page
            .data
            .iter()
            .all(|r| r.user_name.starts_with('A') && r.price_cents >= 2500));
    }

    #[tokio::test]
    async fn test_cross_combination_filter_text_is_data() {
        let db = memory_db().await;
        user(&db, "Ada").await;
        product(&db, "Mug", dollars(8), 1).await;
        product(&db, "100% Cotton Tee", dollars(15), 1).await;

        let injection = Predicate::compare(Column::UserName, Operator::Eq, "x' OR '1'='1");
        let page = db
            .analytics()
            .cross_combination(Some(&injection), PageRequest::first(10).unwrap())
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.metadata.total_records, 0);

        // The wildcard is matched literally
        let percent = Predicate::compare(Column::ProductName, Operator::Contains, "%");
        let page = db
            .analytics()
            .cross_combination(Some(&percent), PageRequest::first(10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].product_name, "100% Cotton Tee");
    }

    #[tokio::test]
    async fn test_cross_combination_rejects_mistyped_filter() {
        let db = memory_db().await;
        let filter = Predicate::compare(Column::PriceCents, Operator::Eq, "cheap");

        let err = db
            .analytics()
            .cross_combination(Some(&filter), PageRequest::first(10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(Failure::from(err).kind, FailureKind::Validation);
    }

    // -------------------------------------------------------------------------
    // users_above_threshold
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_threshold_is_strict_and_sums_spend() {
        let db = memory_db().await;
        let ada = user(&db, "Ada").await;
        let p1 = product(&db, "Mug", dollars(10), 10).await;
        let p2 = product(&db, "Lamp", dollars(50), 10).await;
        place(&db, ada.id, p1.id, 2).await;
        place(&db, ada.id, p2.id, 1).await;

        let analytics = db.analytics();
        let request = PageRequest::first(10).unwrap();

        let above_55 = analytics.users_above_threshold(dollars(55), request).await.unwrap();
        assert_eq!(above_55.data.len(), 1);
        assert_eq!(above_55.data[0].user_id, ada.id);
        assert_eq!(above_55.data[0].total_spent(), dollars(70));

        let above_80 = analytics.users_above_threshold(dollars(80), request).await.unwrap();
        assert!(above_80.is_empty());
        assert_eq!(above_80.metadata.total_records, 0);

        // Exactly at the threshold is excluded
        let at_70 = analytics.users_above_threshold(dollars(70), request).await.unwrap();
        assert!(at_70.is_empty());
    }

    #[tokio::test]
    async fn test_threshold_ordering_and_count() {
        let db = memory_db().await;
        let ada = user(&db, "Ada").await;
        let grace = user(&db, "Grace").await;
        let alan = user(&db, "Alan").await;
        let linus = user(&db, "Linus").await;
        let lamp = product(&db, "Lamp", dollars(50), 100).await;

        place(&db, ada.id, lamp.id, 2).await;
        place(&db, grace.id, lamp.id, 3).await;
        place(&db, alan.id, lamp.id, 2).await;
        place(&db, linus.id, lamp.id, 1).await;

        let all = db
            .analytics()
            .users_above_threshold(dollars(60), PageRequest::first(100).unwrap())
            .await
            .unwrap();
        let ids: Vec<_> = all.data.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, [grace.id, ada.id, alan.id]);
        assert_eq!(all.metadata.total_records, all.data.len() as u64);

        let second = db
            .analytics()
            .users_above_threshold(dollars(60), PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.data[0].user_id, alan.id);
        assert_eq!(second.metadata.total_pages, 2);
    }

    #[tokio::test]
    async fn test_negative_threshold_rejected() {
        let db = memory_db().await;
        let err = db
            .analytics()
            .users_above_threshold(Money::from_cents(-1), PageRequest::first(10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    // -------------------------------------------------------------------------
    // top_product_per_user
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_top_product_ranking() {
        let db = memory_db().await;
        let ada = user(&db, "Ada").await;
        let grace = user(&db, "Grace").await;
        let idle = user(&db, "Idle").await;
        let mug = product(&db, "Mug", dollars(5), 100).await;
        let tee = product(&db, "Tee", dollars(5), 100).await;
        let lamp = product(&db, "Lamp", dollars(30), 100).await;

        // Ada: Mug and Tee tie on quantity and value, lower id wins
        place(&db, ada.id, tee.id, 2).await;
        place(&db, ada.id, mug.id, 1).await;
        place(&db, ada.id, mug.id, 1).await;

        // Grace: Tee and Lamp tie on quantity, higher value wins
        place(&db, grace.id, tee.id, 3).await;
        place(&db, grace.id, lamp.id, 3).await;
        place(&db, grace.id, mug.id, 1).await;

        let page = db
            .analytics()
            .top_product_per_user(PageRequest::first(10).unwrap())
            .await
            .unwrap();

        assert_eq!(page.metadata.total_records, 2);
        assert!(page.data.iter().all(|r| r.user_id != idle.id));

        let ada_top = &page.data[0];
        assert_eq!(ada_top.user_id, ada.id);
        assert_eq!(ada_top.product_id, mug.id);
        assert_eq!(ada_top.top_product, "Mug");
        assert_eq!(ada_top.total_qty, 2);
        assert_eq!(ada_top.total_value(), dollars(10));

        let grace_top = &page.data[1];
        assert_eq!(grace_top.user_id, grace.id);
        assert_eq!(grace_top.product_id, lamp.id);
        assert_eq!(grace_top.total_qty, 3);
        assert_eq!(grace_top.total_value(), dollars(90));
    }

    #[tokio::test]
    async fn test_top_product_pages() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", dollars(5), 100).await;
        for i in 0..3 {
            let u = user(&db, &format!("User {i}")).await;
            place(&db, u.id, mug.id, 1).await;
        }

        let page = db
            .analytics()
            .top_product_per_user(PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].user_name, "User 2");
        assert_eq!(page.metadata.total_records, 3);
        assert_eq!(page.metadata.total_pages, 2);
        assert_eq!(page.metadata.current_page, 2);
    }

    #[tokio::test]
    async fn test_top_product_count_matches_unpaged_rows() {
        let db = memory_db().await;
        let mug = product(&db, "Mug", dollars(5), 100).await;
        let lamp = product(&db, "Lamp", dollars(30), 100).await;
        for i in 0..4 {
            let u = user(&db, &format!("User {i}")).await;
            place(&db, u.id, mug.id, 1).await;
            if i % 2 == 0 {
                place(&db, u.id, lamp.id, 2).await;
            }
        }
        user(&db, "Idle").await;

        let all = db
            .analytics()
            .top_product_per_user(PageRequest::first(100).unwrap())
            .await
            .unwrap();
        assert_eq!(all.data.len(), 4);
        assert_eq!(all.metadata.total_records, all.data.len() as u64);

        let window = db
            .analytics()
            .top_product_per_user(PageRequest::first(3).unwrap())
            .await
            .unwrap();
        assert_eq!(window.data.len(), 3);
        assert_eq!(window.metadata.total_records, 4);
    }

    #[tokio::test]
    async fn test_closed_pool_is_a_query_fault() {
        let db = memory_db().await;
        db.close().await;

        let err = db
            .analytics()
            .top_product_per_user(PageRequest::first(10).unwrap())
            .await
            .unwrap_err();
        assert_eq!(Failure::from(err).kind, FailureKind::QueryFault);
    }
}
