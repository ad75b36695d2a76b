use clap::{Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "GitHub release updater for self-hosted WordPress plugins")]
pub struct UpdaterArgs {
    /// Database holding the cached release lookups.
    #[arg(short, long, default_value = "updater-cache.db", env = "WP_RELEASE_UPDATER_DB")]
    pub database: PathBuf,

    /// Main file of the installed plugin, e.g. `my-plugin/my-plugin.php`.
    #[arg(short, long, env = "WP_RELEASE_UPDATER_PLUGIN_FILE")]
    pub plugin_file: PathBuf,

    /// GitHub organisation or user owning the release repository.
    #[arg(long, env = "WP_RELEASE_UPDATER_OWNER")]
    pub owner: String,

    #[arg(long, env = "WP_RELEASE_UPDATER_REPO")]
    pub repo: String,

    #[arg(long, default_value = "https://api.github.com/", env = "WP_RELEASE_UPDATER_API_BASE")]
    pub api_base: Url,

    /// Defaults to `<slug>_github_response`.
    #[arg(long, env = "WP_RELEASE_UPDATER_CACHE_KEY")]
    pub cache_key: Option<String>,

    #[arg(long, default_value = "4")]
    pub success_ttl_hours: u32,

    #[arg(long, default_value = "1")]
    pub error_ttl_hours: u32,

    /// Version of the host CMS, reported as `tested` and in the user agent.
    #[arg(long, default_value = "6.6", env = "WP_RELEASE_UPDATER_HOST_VERSION")]
    pub host_version: String,

    #[arg(long, default_value = "WordPress")]
    pub user_agent_product: String,

    #[arg(long, env = "WP_RELEASE_UPDATER_ICON_SMALL")]
    pub icon_small: Option<Url>,

    #[arg(long, env = "WP_RELEASE_UPDATER_ICON_LARGE")]
    pub icon_large: Option<Url>,

    /// Reported when the plugin header has no `Requires at least`.
    #[arg(long, default_value = "6.6")]
    pub default_requires: String,

    /// Reported when the plugin header has no `Requires PHP`.
    #[arg(long, default_value = "8.1")]
    pub default_requires_php: String,

    /// Emit diagnostic log entries about failed release lookups.
    #[arg(long, default_value_t = false, env = "WP_RELEASE_UPDATER_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: UpdaterCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum UpdaterCommand {
    /// Check whether a newer release is available.
    Check {
        /// Host update document to merge the result into, in place.
        #[arg(long)]
        updates: Option<PathBuf>,
    },

    /// Print the plugin details record for a slug.
    Info {
        /// Defaults to the installed plugin's slug.
        #[arg(long)]
        slug: Option<String>,
    },

    /// Move a freshly extracted release into the stable plugin directory.
    AfterInstall {
        extracted: PathBuf,

        /// Defaults to the installed plugin's directory.
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Forget the cached release lookup.
    ClearCache,
}
