use crate::api::ReleaseInfo;
use crate::error::UpdaterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A key-value store whose entries expire after a TTL.
///
/// Writes overwrite, there is no locking between concurrent writers.
pub trait TransientStore {
    /// Returns `None` for missing and for expired entries.
    async fn get_transient(&self, key: &str) -> Result<Option<String>, UpdaterError>;

    async fn set_transient(&self, key: &str, value: &str, ttl: Duration)
    -> Result<(), UpdaterError>;

    async fn delete_transient(&self, key: &str) -> Result<(), UpdaterError>;
}

/// The cached outcome of the last release lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CacheEntry {
    Success {
        snapshot_at: DateTime<Utc>,
        release: ReleaseInfo,
    },
    Error {
        snapshot_at: DateTime<Utc>,
        reason: String,
    },
}

impl CacheEntry {
    pub fn success(release: ReleaseInfo) -> Self {
        Self::Success {
            snapshot_at: Utc::now(),
            release,
        }
    }

    pub fn error(reason: impl ToString) -> Self {
        Self::Error {
            snapshot_at: Utc::now(),
            reason: reason.to_string(),
        }
    }
}

/// Typed access to a [`TransientStore`] holding [`CacheEntry`] values.
pub struct ReleaseCache<'a, S> {
    store: &'a S,
    key: &'a str,
}

impl<'a, S: TransientStore> ReleaseCache<'a, S> {
    pub fn new(store: &'a S, key: &'a str) -> Self {
        Self { store, key }
    }

    pub async fn load(&self) -> Result<Option<CacheEntry>, UpdaterError> {
        match self.store.get_transient(self.key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn store(&self, entry: &CacheEntry, ttl: Duration) -> Result<(), UpdaterError> {
        let raw = serde_json::to_string(entry)?;
        self.store.set_transient(self.key, &raw, ttl).await
    }

    pub async fn invalidate(&self) -> Result<(), UpdaterError> {
        self.store.delete_transient(self.key).await
    }
}
