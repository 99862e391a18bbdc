//! Database module: store capability, SQLite pool bootstrap and the
//! subscriber repository.
//!
//! - `store`: the narrow `Store` interface plus its sqlx SQLite implementation.
//! - `repo`: the `SubscriberRepository` contract and its SQL implementation.

pub mod repo;
pub mod store;

pub use repo::{SqlSubscriberRepository, SubscriberRepository};
pub use store::{FromRecord, Record, Release, SqliteStore, Store};

use crate::config::Database;
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type Pool = SqlitePool;

/// Opens the pool described by `cfg`. Foreign keys are enforced so that
/// subscriptions must reference existing subscribers and adverts.
pub async fn init_pool(cfg: &Database) -> Result<Pool> {
    let normalized = prepare_sqlite_url(&cfg.url)?;
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {normalized}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_millis(cfg.acquire_timeout_ms))
        .connect_with(options)
        .await
        .context("failed to open database")?;
    info!(url = %normalized, "database pool ready");
    Ok(pool)
}

/// Splits a file-backed SQLite URL into its path and optional query string.
/// Returns `None` for in-memory databases and non-SQLite URLs.
fn sqlite_file_parts(url: &str) -> Option<(&str, Option<&str>)> {
    let rest = url.strip_prefix("sqlite:")?;
    if rest.starts_with(":memory") {
        return None;
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    (!path.is_empty()).then_some((path, query))
}

fn expand_home(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => Path::new(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Rewrites a file-backed SQLite URL to `sqlite://<absolute-or-relative path>`
/// with `~/` expanded, creating the database's parent directory. Other URLs
/// are returned unchanged.
fn prepare_sqlite_url(url: &str) -> Result<String> {
    let Some((path, query)) = sqlite_file_parts(url) else {
        return Ok(url.to_string());
    };
    let home = std::env::var("HOME").ok();
    let path = expand_home(path, home.as_deref());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }

    let mut rebuilt = format!("sqlite://{}", path.display());
    if let Some(q) = query {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    Ok(rebuilt)
}
