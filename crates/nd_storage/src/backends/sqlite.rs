use async_trait::async_trait;
use chrono::Utc;
use nd_core::{CacheStore, Error, Result};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePool}, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use crate::{BackendConfig, StorageBackend};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cache_sets (
        key TEXT NOT NULL,
        member TEXT NOT NULL,
        expires_at INTEGER NOT NULL,
        PRIMARY KEY (key, member)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cache_hashes (
        key TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        expires_at INTEGER NOT NULL,
        PRIMARY KEY (key, field)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS cache_sets_expiry ON cache_sets (expires_at)",
    "CREATE INDEX IF NOT EXISTS cache_hashes_expiry ON cache_hashes (expires_at)",
];

fn storage_error(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

fn expiry(ttl: Duration) -> i64 {
    Utc::now().timestamp() + ttl.as_secs() as i64
}

/// SQLite-backed cache store; expiry is a unix timestamp checked on every
/// read. Expired rows of both tables are deleted by each write.
pub struct SQLiteStore {
    pool: Arc<SqlitePool>,
}

async fn purge_expired(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>) -> Result<()> {
    let now = Utc::now().timestamp();
    for table in ["cache_sets", "cache_hashes"] {
        sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= ?", table))
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_error("Failed to purge expired rows", e))?;
    }
    Ok(())
}

#[async_trait]
impl StorageBackend for SQLiteStore {
    fn get_error_message() -> &'static str {
        "SQLite cache database should be writable"
    }

    async fn new(config: &BackendConfig) -> Result<Self> {
        let path = config.url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        Self::new_with_path(Path::new(path)).await
    }
}

impl SQLiteStore {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| storage_error("Invalid database path", e))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl CacheStore for SQLiteStore {
    async fn set_replace(&self, key: &str, members: &BTreeSet<String>, ttl: Duration) -> Result<()> {
        let expires_at = expiry(ttl);
        let mut tx = self.pool.begin().await.map_err(|e| storage_error("Failed to begin transaction", e))?;
        purge_expired(&mut tx).await?;

        sqlx::query("DELETE FROM cache_sets WHERE key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to clear set", e))?;

        for member in members {
            sqlx::query("INSERT INTO cache_sets (key, member, expires_at) VALUES (?, ?, ?)")
                .bind(key)
                .bind(member)
                .bind(expires_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("Failed to store set member", e))?;
        }

        tx.commit().await.map_err(|e| storage_error("Failed to commit set", e))
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>> {
        let rows = sqlx::query("SELECT member FROM cache_sets WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(Utc::now().timestamp())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| storage_error("Failed to read set", e))?;

        Ok(rows.into_iter().map(|row| row.get::<String, _>("member")).collect())
    }

    async fn hash_replace(&self, key: &str, fields: &BTreeMap<String, String>, ttl: Duration) -> Result<()> {
        let expires_at = expiry(ttl);
        let mut tx = self.pool.begin().await.map_err(|e| storage_error("Failed to begin transaction", e))?;
        purge_expired(&mut tx).await?;

        sqlx::query("DELETE FROM cache_hashes WHERE key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to clear hash", e))?;

        for (field, value) in fields {
            sqlx::query("INSERT INTO cache_hashes (key, field, value, expires_at) VALUES (?, ?, ?, ?)")
                .bind(key)
                .bind(field)
                .bind(value)
                .bind(expires_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("Failed to store hash field", e))?;
        }

        tx.commit().await.map_err(|e| storage_error("Failed to commit hash", e))
    }

    async fn hash_get_all(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query("SELECT field, value FROM cache_hashes WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(Utc::now().timestamp())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| storage_error("Failed to read hash", e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("field"), row.get::<String, _>("value")))
            .collect())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT key FROM (
                SELECT key, expires_at FROM cache_sets
                UNION ALL
                SELECT key, expires_at FROM cache_hashes
            )
            WHERE substr(key, 1, length(?)) = ? AND expires_at > ?
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .bind(prefix)
        .bind(Utc::now().timestamp())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| storage_error("Failed to list keys", e))?;

        Ok(rows.into_iter().map(|row| row.get::<String, _>("key")).collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Utc::now().timestamp();
        let live = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM (
                SELECT key FROM cache_sets WHERE key = ? AND expires_at > ?
                UNION ALL
                SELECT key FROM cache_hashes WHERE key = ? AND expires_at > ?
            )
            "#,
        )
        .bind(key)
        .bind(now)
        .bind(key)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| storage_error("Failed to check key", e))?
        .get::<i64, _>("n");

        sqlx::query("DELETE FROM cache_sets WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete set", e))?;
        sqlx::query("DELETE FROM cache_hashes WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete hash", e))?;

        Ok(live > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| storage_error("Ping failed", e))?;
        Ok(())
    }
}
