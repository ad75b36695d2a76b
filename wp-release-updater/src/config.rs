use crate::args::UpdaterArgs;
use crate::error::UpdaterError;
use crate::plugin::PluginIdentity;
use std::time::Duration;
use url::Url;

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Everything the updater needs to know about where releases come from and
/// how to describe them. Built once by the composition root.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub owner: String,
    pub repo: String,
    pub api_base: Url,
    pub cache_key: String,
    pub success_ttl: Duration,
    pub error_ttl: Duration,
    pub host_version: String,
    pub user_agent_product: String,
    pub icon_small: Option<Url>,
    pub icon_large: Option<Url>,
    pub identity: PluginIdentity,
    pub defaults: PluginDefaults,
}

/// Values reported when the plugin header lacks them.
#[derive(Debug, Clone)]
pub struct PluginDefaults {
    pub name: String,
    pub author: String,
    pub homepage: String,
    pub requires: String,
    pub requires_php: String,
}

impl UpdaterConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: Url,
        identity: PluginIdentity,
    ) -> Self {
        let owner = owner.into();
        let repo = repo.into();

        Self {
            api_base,
            cache_key: default_cache_key(&identity.slug),
            success_ttl: 4 * HOUR,
            error_ttl: HOUR,
            host_version: "6.6".to_owned(),
            user_agent_product: "WordPress".to_owned(),
            icon_small: None,
            icon_large: None,
            defaults: PluginDefaults {
                name: identity.slug.clone(),
                author: owner.clone(),
                homepage: format!("https://github.com/{}/{}", owner, repo),
                requires: "6.6".to_owned(),
                requires_php: "8.1".to_owned(),
            },
            identity,
            owner,
            repo,
        }
    }

    pub fn from_args(args: &UpdaterArgs) -> Result<Self, UpdaterError> {
        if args.owner.is_empty() || args.repo.is_empty() {
            return Err(UpdaterError::InvalidConfig(
                "owner and repo must not be empty".to_owned(),
            ));
        }

        if args.api_base.cannot_be_a_base() {
            return Err(UpdaterError::InvalidConfig(format!(
                "{} cannot be used as an API base",
                args.api_base
            )));
        }

        let identity = PluginIdentity::from_main_file(&args.plugin_file)?;
        let mut config = Self::new(&args.owner, &args.repo, args.api_base.clone(), identity);

        if let Some(cache_key) = &args.cache_key {
            config.cache_key = cache_key.clone();
        }
        config.success_ttl = HOUR * args.success_ttl_hours;
        config.error_ttl = HOUR * args.error_ttl_hours;
        config.host_version = args.host_version.clone();
        config.user_agent_product = args.user_agent_product.clone();
        config.icon_small = args.icon_small.clone();
        config.icon_large = args.icon_large.clone();
        config.defaults.requires = args.default_requires.clone();
        config.defaults.requires_php = args.default_requires_php.clone();

        Ok(config)
    }

    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.user_agent_product, self.host_version)
    }
}

fn default_cache_key(slug: &str) -> String {
    format!("{}_github_response", slug.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn args_become_config() {
        let args = UpdaterArgs::parse_from([
            "wp-release-updater",
            "--plugin-file",
            "/srv/plugins/weave-starter-plugin/weave-starter-plugin.php",
            "--owner",
            "weavedigitalstudio",
            "--repo",
            "weave-starter-plugin",
            "--host-version",
            "6.7",
            "--error-ttl-hours",
            "2",
            "check",
        ]);

        let config = UpdaterConfig::from_args(&args).unwrap();

        assert_eq!(config.cache_key, "weave_starter_plugin_github_response");
        assert_eq!(config.user_agent(), "WordPress/6.7");
        assert_eq!(config.success_ttl, Duration::from_secs(4 * 60 * 60));
        assert_eq!(config.error_ttl, Duration::from_secs(2 * 60 * 60));
        assert_eq!(config.api_base.as_str(), "https://api.github.com/");
        assert_eq!(
            config.defaults.homepage,
            "https://github.com/weavedigitalstudio/weave-starter-plugin"
        );
        assert_eq!(config.identity.slug, "weave-starter-plugin");
    }

    #[test]
    fn rejects_unusable_api_base() {
        let args = UpdaterArgs::parse_from([
            "wp-release-updater",
            "--plugin-file",
            "plugins/demo/demo.php",
            "--owner",
            "o",
            "--repo",
            "r",
            "--api-base",
            "mailto:someone@example.com",
            "clear-cache",
        ]);

        assert!(matches!(
            UpdaterConfig::from_args(&args),
            Err(UpdaterError::InvalidConfig(_))
        ));
    }
}
