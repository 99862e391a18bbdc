//! Shared fixtures for repository tests.
#![allow(dead_code)]

use advert_subscribers::ids::IdGenerator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SCHEMA: &[&str] = &[
    "CREATE TABLE subscribers (id TEXT PRIMARY KEY, telegram_id TEXT NOT NULL)",
    "CREATE TABLE adverts (advert_id TEXT PRIMARY KEY)",
    "CREATE TABLE subscriptions (
        advert_id TEXT NOT NULL REFERENCES adverts(advert_id),
        subscriber_id TEXT NOT NULL REFERENCES subscribers(id)
    )",
];

/// Single-connection in-memory database with the subscriber schema applied.
pub async fn setup_pool() -> SqlitePool {
    setup_pool_with(SCHEMA).await
}

/// Same as [`setup_pool`] but with caller-provided DDL.
pub async fn setup_pool_with(schema: &[&str]) -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    for stmt in schema {
        sqlx::query(stmt).execute(&pool).await.unwrap();
    }
    pool
}

/// Adverts are owned elsewhere; tests seed them directly.
pub async fn seed_advert(pool: &SqlitePool, advert_id: &str) {
    sqlx::query("INSERT INTO adverts (advert_id) VALUES (?)")
        .bind(advert_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Hands out `id-1`, `id-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        format!("id-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
