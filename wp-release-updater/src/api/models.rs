use crate::error::MalformedRelease;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// The `releases/latest` payload as it comes off the wire.
///
/// Everything is optional here, validation happens in [`ReleaseInfo::try_from`].
#[derive(Debug, Clone, Deserialize)]
pub struct RepoLatestRelease {
    pub tag_name: Option<String>,

    #[serde(default)]
    pub assets: Vec<RepoReleaseAsset>,

    pub published_at: Option<DateTime<Utc>>,

    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoReleaseAsset {
    pub name: Option<String>,
    pub browser_download_url: Option<String>,
}

/// A validated release, safe to cache and to hand out to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub package_url: Url,
    pub assets: Vec<ReleaseAsset>,
    pub published_at: Option<DateTime<Utc>>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: Option<String>,
    pub download_url: Option<Url>,
}

impl TryFrom<RepoLatestRelease> for ReleaseInfo {
    type Error = MalformedRelease;

    fn try_from(value: RepoLatestRelease) -> Result<Self, Self::Error> {
        let tag_name = value
            .tag_name
            .filter(|tag| !tag.trim().is_empty())
            .ok_or(MalformedRelease::MissingTagName)?;

        if value.assets.is_empty() {
            return Err(MalformedRelease::NoAssets);
        }

        let assets: Vec<ReleaseAsset> = value
            .assets
            .into_iter()
            .map(|asset| ReleaseAsset {
                name: asset.name,
                download_url: asset
                    .browser_download_url
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .and_then(|v| Url::parse(v).ok()),
            })
            .collect();

        // The first asset is the zip built by the release workflow.
        let package_url = assets[0]
            .download_url
            .clone()
            .ok_or(MalformedRelease::NoDownloadUrl)?;

        Ok(Self {
            tag_name,
            package_url,
            assets,
            published_at: value.published_at,
            body: value.body.unwrap_or_default(),
        })
    }
}
