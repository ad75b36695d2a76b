use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("an I/O error occurred: {0}")]
    GenericIo(#[from] std::io::Error),

    #[error("database error: {0}")]
    DatabaseError(#[from] libsql::Error),

    #[error("http client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    DeserializeError(#[from] serde::de::value::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why a remote release lookup did not produce a usable release.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("release API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("release API returned HTTP {0}")]
    Status(StatusCode),

    #[error("release API response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Malformed(#[from] MalformedRelease),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRelease {
    #[error("release API response missing tag_name")]
    MissingTagName,

    #[error("release API response has no assets")]
    NoAssets,

    #[error("no download URL found in release assets")]
    NoDownloadUrl,
}

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version component '{0}'")]
    InvalidComponent(String),

    #[error("invalid pre-release suffix: {0}")]
    InvalidPrerelease(#[from] semver::Error),
}
