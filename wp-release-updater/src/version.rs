use crate::error::VersionError;
use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Strip any leading `v` from a release tag or plugin version.
pub fn normalize_version(raw: &str) -> &str {
    raw.trim().trim_start_matches('v')
}

/// A dotted numeric plugin version such as `1.2`, `v1.2.3` or `2.0.0-beta.1`.
///
/// Missing trailing components compare as zero, so `1.2` equals `1.2.0`.
/// A pre-release sorts before the plain release, build metadata is ignored.
#[derive(Debug, Clone)]
pub struct PluginVersion {
    components: Vec<u64>,
    pre: Prerelease,
}

impl PluginVersion {
    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for PluginVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = normalize_version(s);
        let version = version.split_once('+').map_or(version, |(v, _build)| v);

        let (core, pre) = match version.split_once('-') {
            Some((core, pre)) => (core, Prerelease::new(pre)?),
            None => (version, Prerelease::EMPTY),
        };

        if core.is_empty() {
            return Err(VersionError::Empty);
        }

        let components = core
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| VersionError::InvalidComponent(part.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components, pre })
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());

        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pre.cmp(&other.pre))
    }
}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PluginVersion {}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }

        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }

        Ok(())
    }
}

/// Whether `latest` is strictly newer than `installed`.
///
/// Versions that fail to parse never count as newer.
pub fn is_newer(latest: &str, installed: &str) -> bool {
    match (latest.parse::<PluginVersion>(), installed.parse::<PluginVersion>()) {
        (Ok(latest), Ok(installed)) => latest > installed,
        (Err(err), _) => {
            tracing::debug!("Ignoring unparsable release version '{}': {}", latest, err);
            false
        }
        (_, Err(err)) => {
            tracing::debug!("Ignoring unparsable installed version '{}': {}", installed, err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PluginVersion {
        s.parse().unwrap()
    }

    #[test]
    fn strips_leading_v() {
        assert_eq!(normalize_version("v1.2.3"), "1.2.3");
        assert_eq!(normalize_version("1.2.3"), "1.2.3");
        assert_eq!(normalize_version(" v2.0 "), "2.0");
        assert_eq!(v("v1.2.3"), v("1.2.3"));
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.2.0.1") > v("1.2"));
    }

    #[test]
    fn components_compare_numerically() {
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("1.3.0") > v("1.2.3"));
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert!(v("1.0.0-beta.1") < v("1.0.0"));
        assert!(v("1.0.0-beta.2") > v("1.0.0-beta.1"));
        assert!(v("1.0.1-alpha") > v("1.0.0"));
        assert_eq!(v("1.0.0+build.5"), v("1.0.0"));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<PluginVersion>().is_err());
        assert!("v".parse::<PluginVersion>().is_err());
        assert!("1.x.0".parse::<PluginVersion>().is_err());
        assert!("1..0".parse::<PluginVersion>().is_err());
    }

    #[test]
    fn newer_detection() {
        assert!(is_newer("v1.3.0", "1.2.3"));
        assert!(!is_newer("v1.9.9", "2.0.0"));
        assert!(!is_newer("v1.2.3", "1.2.3"));
        assert!(!is_newer("1.2", "v1.2.0"));
        assert!(!is_newer("not-a-version", "1.0.0"));
        assert!(!is_newer("1.0.0", "unknown"));
    }

    #[test]
    fn displays_normalized() {
        assert_eq!(v("v1.2.3").to_string(), "1.2.3");
        assert_eq!(v("2.0-rc.1").to_string(), "2.0-rc.1");
        assert_eq!(v("1.4").to_string(), "1.4");
    }
}
