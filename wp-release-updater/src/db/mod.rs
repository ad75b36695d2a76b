mod models;
pub use models::*;

use crate::cache::TransientStore;
use crate::error::UpdaterError;
use chrono::Utc;
use libsql::{Connection, Row};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

/// Transient store backed by a local libsql database.
#[derive(Clone)]
pub struct Database {
    connection: Connection,
}

fn map_row_de<T: DeserializeOwned>(r: Row) -> Result<T, UpdaterError> {
    libsql::de::from_row::<T>(&r).map_err(|e| {
        tracing::error!(
            "Failed to deserialize {}: {}",
            std::any::type_name::<T>(),
            e
        );

        UpdaterError::from(e)
    })
}

fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

impl Database {
    /// Connect to the database.
    pub async fn setup(path: &Path) -> Result<Self, UpdaterError> {
        tracing::debug!("Setting up database at {}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }

        let db = libsql::Builder::new_local(path).build().await?;

        // Ensure the database is created and the schema is up to date.
        let connection = db.connect()?;

        connection.query("PRAGMA journal_mode = WAL", ()).await?;
        connection.query("PRAGMA synchronous = NORMAL", ()).await?;

        tracing::debug!("Connected to database");
        Self::ensure_db_structure(&connection).await?;

        let database = Self { connection };
        database.purge_expired().await?;

        Ok(database)
    }

    async fn ensure_db_structure(connection: &Connection) -> Result<(), UpdaterError> {
        tracing::trace!("Setting up database structure...");

        connection
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS transients (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
        "#,
                (),
            )
            .await?;

        tracing::trace!("Database structure created.");

        Ok(())
    }

    /// Drop every transient whose TTL has run out.
    #[tracing::instrument(skip(self))]
    pub async fn purge_expired(&self) -> Result<u64, UpdaterError> {
        let removed = self
            .connection
            .execute(
                "DELETE FROM transients WHERE expires_at <= ?1",
                libsql::params![now_timestamp()],
            )
            .await?;

        if removed > 0 {
            tracing::debug!("Purged {} expired transients", removed);
        }

        Ok(removed)
    }

    #[tracing::instrument(skip(self))]
    async fn get_cached_transient(&self, key: &str) -> Result<Option<CachedTransient>, UpdaterError> {
        self.connection
            .query(
                "SELECT key, value, expires_at FROM transients WHERE key = ?1 AND expires_at > ?2",
                libsql::params![key, now_timestamp()],
            )
            .await?
            .next()
            .await?
            .map(map_row_de)
            .transpose()
    }
}

impl TransientStore for Database {
    async fn get_transient(&self, key: &str) -> Result<Option<String>, UpdaterError> {
        Ok(self.get_cached_transient(key).await?.map(|t| {
            tracing::trace!("Transient {} valid until {}", t.key, t.expires_at);
            t.value
        }))
    }

    #[tracing::instrument(skip(self, value))]
    async fn set_transient(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), UpdaterError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now_timestamp().saturating_add(ttl_secs);

        self.connection
            .execute(
                r#"
                        INSERT INTO transients
                            (key, value, expires_at)
                        VALUES (?1, ?2, ?3) ON CONFLICT DO UPDATE SET
                            value = ?2, expires_at = ?3;
                     "#,
                libsql::params![key, value, expires_at],
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_transient(&self, key: &str) -> Result<(), UpdaterError> {
        self.connection
            .execute("DELETE FROM transients WHERE key = ?1", [key])
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[tokio::test]
    async fn set_get_delete() {
        let db = Database::setup(Path::new(":memory:")).await.unwrap();

        assert_eq!(db.get_transient("release").await.unwrap(), None);

        db.set_transient("release", "first", HOUR).await.unwrap();
        assert_eq!(db.get_transient("release").await.unwrap().as_deref(), Some("first"));

        db.set_transient("release", "second", HOUR).await.unwrap();
        assert_eq!(db.get_transient("release").await.unwrap().as_deref(), Some("second"));

        db.delete_transient("release").await.unwrap();
        assert_eq!(db.get_transient("release").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_invisible_and_purged() {
        let db = Database::setup(Path::new(":memory:")).await.unwrap();

        db.set_transient("stale", "old", Duration::ZERO).await.unwrap();
        db.set_transient("fresh", "new", HOUR).await.unwrap();

        assert_eq!(db.get_transient("stale").await.unwrap(), None);
        assert_eq!(db.purge_expired().await.unwrap(), 1);
        assert_eq!(db.get_transient("fresh").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let db = Database::setup(&path).await.unwrap();
            db.set_transient("release", "kept", HOUR).await.unwrap();
        }

        let db = Database::setup(&path).await.unwrap();
        assert_eq!(db.get_transient("release").await.unwrap().as_deref(), Some("kept"));
    }
}
