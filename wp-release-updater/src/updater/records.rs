use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icons {
    #[serde(rename = "1x", default, skip_serializing_if = "Option::is_none")]
    pub small: Option<Url>,

    #[serde(rename = "2x", default, skip_serializing_if = "Option::is_none")]
    pub large: Option<Url>,
}

/// Update availability entry handed to the host's update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub slug: String,
    pub plugin: String,
    pub new_version: String,
    pub tested: String,
    /// Empty when the installed version is current.
    pub package: String,
    #[serde(default)]
    pub icons: Icons,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum UpdateCheck {
    Available(UpdateRecord),
    UpToDate(UpdateRecord),
    /// No release information or no installed version, leave the host alone.
    NoInformation,
}

impl UpdateCheck {
    pub fn has_update(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// The host's update document, keyed by plugin basename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginUpdates {
    #[serde(default)]
    pub checked: BTreeMap<String, String>,

    #[serde(default)]
    pub response: BTreeMap<String, UpdateRecord>,

    #[serde(default)]
    pub no_update: BTreeMap<String, UpdateRecord>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PluginUpdates {
    /// Merge a check result into the document.
    ///
    /// Nothing happens until the host has populated `checked`. An existing
    /// `no_update` entry is never replaced.
    pub fn apply(&mut self, check: UpdateCheck) {
        if self.checked.is_empty() {
            return;
        }

        match check {
            UpdateCheck::Available(record) => {
                self.response.insert(record.plugin.clone(), record);
            }
            UpdateCheck::UpToDate(record) => {
                self.response.remove(&record.plugin);
                self.no_update.entry(record.plugin.clone()).or_insert(record);
            }
            UpdateCheck::NoInformation => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub description: String,
    pub changelog: String,
}

/// Record for the host's plugin details view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDetails {
    pub name: String,
    pub slug: String,
    pub version: String,
    pub author: String,
    pub homepage: String,
    pub tested: String,
    pub requires: String,
    pub requires_php: String,
    pub last_updated: String,
    pub download_link: String,
    pub sections: Sections,
    pub icons: Icons,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(package: &str) -> UpdateRecord {
        UpdateRecord {
            slug: "demo".to_owned(),
            plugin: "demo/demo.php".to_owned(),
            new_version: "1.1.0".to_owned(),
            tested: "6.6".to_owned(),
            package: package.to_owned(),
            icons: Icons::default(),
        }
    }

    fn checked() -> PluginUpdates {
        PluginUpdates {
            checked: BTreeMap::from([("demo/demo.php".to_owned(), "1.0.0".to_owned())]),
            ..Default::default()
        }
    }

    #[test]
    fn unchecked_document_is_untouched() {
        let mut updates = PluginUpdates::default();
        updates.apply(UpdateCheck::Available(record("https://example.com/demo.zip")));

        assert_eq!(updates, PluginUpdates::default());
    }

    #[test]
    fn available_goes_into_response() {
        let mut updates = checked();
        updates.apply(UpdateCheck::Available(record("https://example.com/demo.zip")));

        assert_eq!(
            updates.response["demo/demo.php"].package,
            "https://example.com/demo.zip"
        );
        assert!(updates.no_update.is_empty());
    }

    #[test]
    fn up_to_date_clears_response_and_keeps_existing_no_update() {
        let mut updates = checked();
        updates.apply(UpdateCheck::Available(record("https://example.com/demo.zip")));

        let mut previous = record("");
        previous.new_version = "0.9.0".to_owned();
        updates.no_update.insert("demo/demo.php".to_owned(), previous);

        updates.apply(UpdateCheck::UpToDate(record("")));

        assert!(updates.response.is_empty());
        assert_eq!(updates.no_update["demo/demo.php"].new_version, "0.9.0");
    }

    #[test]
    fn no_information_changes_nothing() {
        let mut updates = checked();
        updates.apply(UpdateCheck::Available(record("https://example.com/demo.zip")));
        let before = updates.clone();

        updates.apply(UpdateCheck::NoInformation);
        assert_eq!(updates, before);
    }

    #[test]
    fn document_keeps_unknown_fields() {
        let json = serde_json::json!({
            "last_checked": 1714557600,
            "checked": { "demo/demo.php": "1.0.0" },
            "response": {},
            "translations": []
        });

        let mut updates: PluginUpdates = serde_json::from_value(json).unwrap();
        updates.apply(UpdateCheck::UpToDate(record("")));

        let out = serde_json::to_value(&updates).unwrap();
        assert_eq!(out["last_checked"], 1714557600);
        assert_eq!(out["no_update"]["demo/demo.php"]["package"], "");
        assert_eq!(out["no_update"]["demo/demo.php"]["icons"], serde_json::json!({}));
    }

    #[test]
    fn check_serializes_with_status() {
        let json = serde_json::to_value(UpdateCheck::NoInformation).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "no_information" }));

        let json = serde_json::to_value(UpdateCheck::Available(record("x"))).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["record"]["new_version"], "1.1.0");
    }
}
