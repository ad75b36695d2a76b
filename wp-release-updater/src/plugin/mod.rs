mod header;
pub use header::*;

use crate::error::UpdaterError;
use std::path::{Path, PathBuf};

/// Where the plugin lives and how the host refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    /// `<directory>/<main file>`, e.g. `weave-starter-plugin/weave-starter-plugin.php`.
    pub basename: String,
    pub slug: String,
    pub install_dir: PathBuf,
}

impl PluginIdentity {
    pub fn from_main_file(main_file: &Path) -> Result<Self, UpdaterError> {
        let invalid = || {
            UpdaterError::InvalidConfig(format!(
                "plugin file {} must live inside a plugin directory",
                main_file.display()
            ))
        };

        let file_name = main_file
            .file_name()
            .and_then(|v| v.to_str())
            .ok_or_else(invalid)?;

        let install_dir = main_file
            .parent()
            .filter(|v| !v.as_os_str().is_empty())
            .ok_or_else(invalid)?;

        let slug = install_dir
            .file_name()
            .and_then(|v| v.to_str())
            .ok_or_else(invalid)?;

        Ok(Self {
            basename: format!("{}/{}", slug, file_name),
            slug: slug.to_owned(),
            install_dir: install_dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_from_main_file() {
        let identity = PluginIdentity::from_main_file(Path::new(
            "/srv/wp-content/plugins/weave-starter-plugin/weave-starter-plugin.php",
        ))
        .unwrap();

        assert_eq!(identity.basename, "weave-starter-plugin/weave-starter-plugin.php");
        assert_eq!(identity.slug, "weave-starter-plugin");
        assert_eq!(
            identity.install_dir,
            Path::new("/srv/wp-content/plugins/weave-starter-plugin")
        );
    }

    #[test]
    fn bare_file_has_no_identity() {
        assert!(PluginIdentity::from_main_file(Path::new("plugin.php")).is_err());
    }
}
