//! Fixtures shared by the storage tests.

use std::time::Duration;

use tempfile::TempDir;

use crate::{Database, DbConfig};
use orderly_core::{Money, NewProduct, NewUser, Product, User};

pub async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File-backed database, needed whenever more than one connection must see
/// the same data.
pub async fn file_db(dir: &TempDir) -> Database {
    file_db_with(dir, |config| config).await
}

pub async fn file_db_with(dir: &TempDir, tweak: impl FnOnce(DbConfig) -> DbConfig) -> Database {
    let config = DbConfig::new(dir.path().join("orderly.db"))
        .max_connections(8)
        .lock_timeout(Duration::from_secs(10));
    Database::new(tweak(config)).await.unwrap()
}

pub async fn user(db: &Database, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    db.users().insert(&NewUser::new(name, email)).await.unwrap()
}

pub async fn product(db: &Database, name: &str, price: Money, stock: i64) -> Product {
    db.products()
        .insert(&NewProduct::new(name, price, stock))
        .await
        .unwrap()
}

pub async fn stock_of(db: &Database, product_id: i64) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

pub fn dollars(major: i64) -> Money {
    Money::from_major_minor(major, 0)
}
