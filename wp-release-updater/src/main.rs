mod api;
mod args;
mod cache;
mod config;
mod db;
mod error;
mod plugin;
mod updater;
mod version;

use clap::Parser as _;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use crate::api::GithubReleaseApi;
use crate::args::{UpdaterArgs, UpdaterCommand};
use crate::config::UpdaterConfig;
use crate::db::Database;
use crate::error::UpdaterError;
use crate::plugin::PluginHeaderFile;
use crate::updater::{PluginUpdates, ReleaseUpdater};

fn main() {
    let args = UpdaterArgs::parse();

    // Failed lookups are only reported at debug level, `--debug` opts into them.
    let default_level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("WP_RELEASE_UPDATER_LOG")
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build() {
        Ok(v) => v.block_on(async_main(args)),
        Err(err) => {
            tracing::error!("Failed to create tokio runtime: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        tracing::error!("Error: {:?}", err);
        std::process::exit(1);
    }
}

async fn async_main(args: UpdaterArgs) -> Result<(), UpdaterError> {
    tracing::trace!("args = {:#?}", args);

    let config = UpdaterConfig::from_args(&args)?;
    let api = GithubReleaseApi::new(&config)?;
    let database = Database::setup(&args.database).await?;
    let metadata = PluginHeaderFile::new(&args.plugin_file);

    let updater = ReleaseUpdater::new(config, api, database, metadata);

    match args.command {
        UpdaterCommand::Check { updates: None } => {
            let check = updater.check_for_update().await;
            print_json(&check)?;
        }
        UpdaterCommand::Check {
            updates: Some(path),
        } => {
            let check = updater.check_for_update().await;
            let mut document = read_updates(&path).await?;

            if check.has_update() {
                tracing::info!("Recording available update in {}", path.display());
            }

            document.apply(check);
            tokio::fs::write(&path, serde_json::to_vec_pretty(&document)?).await?;
        }
        UpdaterCommand::Info { slug } => {
            let slug = slug.unwrap_or_else(|| updater.config().identity.slug.clone());
            print_json(&updater.describe_release(&slug).await)?;
        }
        UpdaterCommand::AfterInstall { extracted, target } => {
            let target = target.unwrap_or_else(|| updater.config().identity.install_dir.clone());
            let destination = updater.after_install(&extracted, &target).await?;

            #[derive(Serialize)]
            struct InstallResult<'a> {
                destination: &'a Path,
            }

            print_json(&InstallResult {
                destination: &destination,
            })?;
        }
        UpdaterCommand::ClearCache => {
            updater.clear_cache().await?;
            tracing::info!("Release cache cleared");
        }
    }

    Ok(())
}

/// A missing document is treated as an empty one.
async fn read_updates(path: &Path) -> Result<PluginUpdates, UpdaterError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(serde_json::from_slice(&data)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(PluginUpdates::default()),
        Err(err) => Err(err.into()),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), UpdaterError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    std::io::Write::write_all(&mut stdout, b"\n")?;

    Ok(())
}
