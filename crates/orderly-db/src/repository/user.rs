//! # User Repository
//!
//! Users are administered outside the order path: created here, listed,
//! looked up. There is no update or delete, since orders reference them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::fetch_page;
use orderly_core::validation::validate_new_user;
use orderly_core::{NewUser, Page, PageRequest, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Ok(User)` - Inserted user with its assigned id
    /// * `Err(DbError::Validation)` - Name or email malformed
    /// * `Err(DbError::UniqueViolation)` - Email already exists
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        validate_new_user(user)?;

        let name = user.name.trim();
        let email = user.email.trim();

        debug!(email = %email, "Inserting user");

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email),
            other => other,
        })
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users WHERE email = ?1",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists users ordered by id.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<User>> {
        debug!(page = page.page(), page_size = page.page_size(), "Listing users");

        fetch_page(
            &self.pool,
            "SELECT id, name, email, created_at FROM users ORDER BY id LIMIT ? OFFSET ?",
            "SELECT COUNT(*) FROM users",
            page,
        )
        .await
    }

    /// Counts all users.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
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
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let user = db
            .users()
            .insert(&NewUser::new("  Ada ", "ada@example.com"))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.name, "Ada");

        let found = db.users().get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found, user);
        let by_email = db.users().get_by_email("ada@example.com").await.unwrap();
        assert_eq!(by_email, Some(user));
        assert!(db.users().get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = setup().await;
        db.users()
            .insert(&NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        let err = db
            .users()
            .insert(&NewUser::new("Other Ada", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_user_never_reaches_storage() {
        let db = setup().await;
        let err = db
            .users()
            .insert(&NewUser::new("Ada", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(db.users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_second_page_of_six_users() {
        let db = setup().await;
        for i in 1..=6 {
            db.users()
                .insert(&NewUser::new(format!("User {i}"), format!("user{i}@example.com")))
                .await
                .unwrap();
        }

        let page = db.users().list(PageRequest::new(2, 5).unwrap()).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "User 6");
        assert_eq!(page.metadata.total_records, 6);
        assert_eq!(page.metadata.total_pages, 2);
        assert_eq!(page.metadata.current_page, 2);
        assert_eq!(page.metadata.page_size, 5);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let db = setup().await;
        db.users()
            .insert(&NewUser::new("Ada", "ada@example.com"))
            .await
            .unwrap();

        let page = db.users().list(PageRequest::new(4, 10).unwrap()).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.metadata.total_records, 1);
        assert_eq!(page.metadata.total_pages, 1);
    }
}
