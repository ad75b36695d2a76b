use std::path::PathBuf;

/// Only the start of the main file is scanned for header fields.
const HEADER_SCAN_BYTES: usize = 8 * 1024;

/// Installed plugin header data. Never written by the updater.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPluginMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub homepage: Option<String>,
    pub requires_host: Option<String>,
    pub requires_runtime: Option<String>,
}

impl InstalledPluginMetadata {
    /// Parse the `Key: Value` comment header at the top of a plugin file.
    pub fn parse_header(source: &str) -> Self {
        Self {
            name: header_field(source, "Plugin Name"),
            version: header_field(source, "Version"),
            description: header_field(source, "Description"),
            author: header_field(source, "Author"),
            homepage: header_field(source, "Plugin URI"),
            requires_host: header_field(source, "Requires at least"),
            requires_runtime: header_field(source, "Requires PHP"),
        }
    }
}

fn header_field(source: &str, name: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let line = line.trim_start();
        let line = line.strip_prefix("<?php").unwrap_or(line);
        let line = line.trim_start_matches([' ', '\t', '/', '*', '#', '@']);

        let (key, value) = line.split_once(':')?;
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }

        let value = value.trim();
        let value = value.strip_suffix("*/").unwrap_or(value).trim_end();

        (!value.is_empty()).then(|| value.to_owned())
    })
}

/// Source of the installed plugin's metadata.
pub trait PluginMetadataSource {
    /// `None` when the metadata cannot be read at all.
    async fn read_metadata(&self) -> Option<InstalledPluginMetadata>;
}

/// Reads metadata from the header of the plugin's main file.
#[derive(Debug, Clone)]
pub struct PluginHeaderFile {
    path: PathBuf,
}

impl PluginHeaderFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PluginMetadataSource for PluginHeaderFile {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn read_metadata(&self) -> Option<InstalledPluginMetadata> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("Failed to read plugin header: {}", err);
                return None;
            }
        };

        let head = &data[..data.len().min(HEADER_SCAN_BYTES)];
        Some(InstalledPluginMetadata::parse_header(
            &String::from_utf8_lossy(head),
        ))
    }
}
