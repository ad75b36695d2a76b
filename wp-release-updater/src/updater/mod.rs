mod records;
pub use records::*;

use crate::api::{GithubReleaseApi, ReleaseInfo};
use crate::cache::{CacheEntry, ReleaseCache, TransientStore};
use crate::config::UpdaterConfig;
use crate::error::UpdaterError;
use crate::plugin::{InstalledPluginMetadata, PluginMetadataSource};
use crate::version::{is_newer, normalize_version};
use chrono::SecondsFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Discovers GitHub releases for one installed plugin and applies the
/// directory fix-up after the host installed one.
///
/// Remote failures never surface as errors: they are cached for the error TTL
/// and reported as "no release available".
pub struct ReleaseUpdater<S, M> {
    config: UpdaterConfig,
    api: GithubReleaseApi,
    store: S,
    metadata: M,
    latest: Mutex<Option<ReleaseInfo>>,
}

impl<S, M> ReleaseUpdater<S, M>
where
    S: TransientStore,
    M: PluginMetadataSource,
{
    pub fn new(config: UpdaterConfig, api: GithubReleaseApi, store: S, metadata: M) -> Self {
        Self {
            config,
            api,
            store,
            metadata,
            latest: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    fn cache(&self) -> ReleaseCache<'_, S> {
        ReleaseCache::new(&self.store, &self.config.cache_key)
    }

    fn remembered(&self) -> Option<ReleaseInfo> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remember(&self, release: Option<ReleaseInfo>) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = release;
    }

    /// The latest release, from memory, the shared cache, or the API.
    ///
    /// `None` while a failed lookup is cached.
    #[tracing::instrument(skip(self), fields(cache_key = self.config.cache_key.as_str()))]
    pub async fn fetch_latest_release(&self) -> Option<ReleaseInfo> {
        if let Some(release) = self.remembered() {
            return Some(release);
        }

        match self.cache().load().await {
            Ok(Some(CacheEntry::Error { snapshot_at, reason })) => {
                tracing::debug!(
                    "Release lookup failed at {} ({}), not retrying yet",
                    snapshot_at,
                    reason
                );
                return None;
            }
            Ok(Some(CacheEntry::Success { release, .. })) => {
                self.remember(Some(release.clone()));
                return Some(release);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("Ignoring unreadable release cache: {}", err),
        }

        let (entry, ttl, release) = match self.api.fetch_latest_release().await {
            Ok(release) => (
                CacheEntry::success(release.clone()),
                self.config.success_ttl,
                Some(release),
            ),
            Err(err) => {
                tracing::debug!("GitHub API error: {}", err);
                (CacheEntry::error(&err), self.config.error_ttl, None)
            }
        };

        if let Err(err) = self.cache().store(&entry, ttl).await {
            tracing::warn!("Failed to cache release lookup: {}", err);
        }

        self.remember(release.clone());
        release
    }

    /// Compare the installed plugin version against the latest release.
    pub async fn check_for_update(&self) -> UpdateCheck {
        let installed = self
            .metadata
            .read_metadata()
            .await
            .and_then(|m| m.version)
            .filter(|v| !v.trim().is_empty());

        let Some(installed) = installed else {
            tracing::debug!("Installed plugin version unknown, skipping update check");
            return UpdateCheck::NoInformation;
        };

        self.check_installed_version(&installed).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn check_installed_version(&self, installed: &str) -> UpdateCheck {
        let Some(release) = self.fetch_latest_release().await else {
            return UpdateCheck::NoInformation;
        };

        let current = normalize_version(installed);
        let latest = normalize_version(&release.tag_name);

        let mut record = UpdateRecord {
            slug: self.config.identity.slug.clone(),
            plugin: self.config.identity.basename.clone(),
            new_version: latest.to_owned(),
            tested: self.config.host_version.clone(),
            package: release.package_url.to_string(),
            icons: self.icons(),
        };

        if is_newer(latest, current) {
            tracing::info!("Update available: {} -> {}", current, latest);
            UpdateCheck::Available(record)
        } else {
            // An empty package keeps the host from reinstalling the current version.
            record.package.clear();
            UpdateCheck::UpToDate(record)
        }
    }

    /// Details record for the host's "view details" lookup of `slug`.
    ///
    /// `None` for other plugins' slugs and while no release is available.
    pub async fn describe_release(&self, slug: &str) -> Option<PluginDetails> {
        if slug != self.config.identity.slug {
            return None;
        }

        let release = self.fetch_latest_release().await?;
        let metadata = self.metadata.read_metadata().await.unwrap_or_default();
        let defaults = &self.config.defaults;

        let InstalledPluginMetadata {
            name,
            description,
            author,
            homepage,
            requires_host,
            requires_runtime,
            ..
        } = metadata;

        Some(PluginDetails {
            name: name.unwrap_or_else(|| defaults.name.clone()),
            slug: self.config.identity.slug.clone(),
            version: normalize_version(&release.tag_name).to_owned(),
            author: author.unwrap_or_else(|| defaults.author.clone()),
            homepage: homepage.unwrap_or_else(|| defaults.homepage.clone()),
            tested: self.config.host_version.clone(),
            requires: requires_host.unwrap_or_else(|| defaults.requires.clone()),
            requires_php: requires_runtime.unwrap_or_else(|| defaults.requires_php.clone()),
            last_updated: release
                .published_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            download_link: release.package_url.to_string(),
            sections: Sections {
                description: description.unwrap_or_default(),
                changelog: release.body,
            },
            icons: self.icons(),
        })
    }

    /// Move the extracted release directory to `target` and forget the cached
    /// lookup, whether or not the move worked.
    #[tracing::instrument(skip(self))]
    pub async fn after_install(
        &self,
        extracted: &Path,
        target: &Path,
    ) -> Result<PathBuf, UpdaterError> {
        let moved = move_directory(extracted, target).await;

        if let Err(err) = self.clear_cache().await {
            tracing::warn!("Failed to clear release cache after install: {}", err);
        }

        moved?;
        tracing::info!("Installed release into {}", target.display());

        Ok(target.to_path_buf())
    }

    /// Forget both the shared cache entry and the in-memory copy.
    pub async fn clear_cache(&self) -> Result<(), UpdaterError> {
        self.remember(None);
        self.cache().invalidate().await
    }

    fn icons(&self) -> Icons {
        Icons {
            small: self.config.icon_small.clone(),
            large: self.config.icon_large.clone(),
        }
    }
}

async fn move_directory(from: &Path, to: &Path) -> std::io::Result<()> {
    if from == to {
        return Ok(());
    }

    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // The host clears the old install first, an empty directory may remain.
    match tokio::fs::remove_dir(to).await {
        Ok(()) => tracing::debug!("Removed empty install directory {}", to.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    tokio::fs::rename(from, to).await
}
