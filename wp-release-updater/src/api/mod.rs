mod models;
pub use models::*;

use crate::config::UpdaterConfig;
use crate::error::{FetchError, UpdaterError};
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};

#[derive(Debug, Clone)]
pub struct GithubReleaseApi {
    client: Client,
    base: Url,
    owner: String,
    repo: String,
}

impl GithubReleaseApi {
    /// Prepare the API client.
    pub fn new(config: &UpdaterConfig) -> Result<Self, UpdaterError> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .redirect(Policy::limited(10))
            .hickory_dns(true)
            .build()?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// Fetch and validate the latest published release.
    #[tracing::instrument(skip(self), fields(owner = self.owner.as_str(), repo = self.repo.as_str()))]
    pub async fn fetch_latest_release(&self) -> Result<ReleaseInfo, FetchError> {
        let response = self
            .client
            .get(self.path(["repos", &self.owner, &self.repo, "releases", "latest"]))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }

        let data = response.bytes().await?;
        let raw: RepoLatestRelease = serde_json::from_slice(&data)?;

        Ok(ReleaseInfo::try_from(raw)?)
    }

    fn path(&self, segments: impl IntoIterator<Item = impl AsRef<str>>) -> Url {
        let mut new_path = self.base.clone();

        // Config validation rejects cannot-be-a-base URLs.
        if let Ok(mut path) = new_path.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        new_path
    }
}
