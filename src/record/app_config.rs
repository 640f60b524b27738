//! Application config document: scanned folders and model names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model roles the analysis layer looks up by name.
pub const DEFAULT_MODELS: &[(&str, &str)] = &[
    ("text_quality", "qwen2.5:7b-instruct-q4_K_M"),
    ("text_fast", "qwen2.5:3b-instruct-q4_K_M"),
    ("vision", "moondream:latest"),
    ("embed", "nomic-embed-text:latest"),
];

/// Contents of `laserflix_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root folders that get scanned for projects, in insertion order.
    #[serde(default)]
    pub folders: Vec<String>,
    /// Model name per role.
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, String>,
}

fn default_models() -> BTreeMap<String, String> {
    DEFAULT_MODELS
        .iter()
        .map(|(role, model)| (role.to_string(), model.to_string()))
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            models: default_models(),
        }
    }
}

impl AppConfig {
    /// Add a folder. Returns false if it was already present.
    pub fn add_folder(&mut self, folder: impl Into<String>) -> bool {
        let folder = folder.into();
        if self.folders.contains(&folder) {
            return false;
        }
        self.folders.push(folder);
        true
    }

    /// Remove a folder. Returns false if it was not present.
    pub fn remove_folder(&mut self, folder: &str) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f != folder);
        self.folders.len() != before
    }

    pub fn model(&self, role: &str) -> Option<&str> {
        self.models.get(role).map(String::as_str)
    }

    /// Drop duplicate folders and fill in missing model roles.
    ///
    /// Returns the number of changes made.
    pub(crate) fn normalize_entries(&mut self) -> usize {
        let mut changes = 0;
        let mut seen = Vec::with_capacity(self.folders.len());
        for folder in std::mem::take(&mut self.folders) {
            if seen.contains(&folder) {
                changes += 1;
            } else {
                seen.push(folder);
            }
        }
        self.folders = seen;

        for (role, model) in DEFAULT_MODELS {
            if !self.models.contains_key(*role) {
                self.models.insert(role.to_string(), model.to_string());
                changes += 1;
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_folder_no_duplicates() {
        let mut config = AppConfig::default();
        assert!(config.add_folder("/designs"));
        assert!(!config.add_folder("/designs"));
        assert_eq!(config.folders.len(), 1);
        assert!(config.remove_folder("/designs"));
        assert!(!config.remove_folder("/designs"));
    }

    #[test]
    fn test_missing_models_get_defaults() {
        let mut config: AppConfig =
            serde_json::from_str(r#"{"folders": ["/a", "/a", "/b"], "models": {"vision": "llava"}}"#)
                .unwrap();
        let changes = config.normalize_entries();
        assert_eq!(config.folders, vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(config.model("vision"), Some("llava"));
        assert_eq!(config.model("embed"), Some("nomic-embed-text:latest"));
        assert_eq!(changes, 1 + DEFAULT_MODELS.len() - 1);
    }
}
