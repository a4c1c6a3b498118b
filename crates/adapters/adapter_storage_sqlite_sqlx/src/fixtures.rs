//! Seed helpers for repository tests.

use sqlx::SqlitePool;

use crate::pool::Config;

pub(crate) async fn pool() -> SqlitePool {
    Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: crate::pool::DEFAULT_MAX_CONNECTIONS,
    }
    .build()
    .await
    .unwrap()
    .pool()
    .clone()
}

pub(crate) async fn user(pool: &SqlitePool, id: i64, username: &str) {
    sqlx::query("INSERT INTO users (id, username, country_code) VALUES (?, ?, 'AU')")
        .bind(id)
        .bind(username)
        .execute(pool)
        .await
        .unwrap();
}

pub(crate) async fn forum(pool: &SqlitePool, id: i64, name: &str) {
    sqlx::query("INSERT INTO forums (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
}

pub(crate) async fn delete_post(pool: &SqlitePool, id: i64) {
    sqlx::query("UPDATE posts SET deleted_at = '2024-01-01T00:00:00+00:00' WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}
