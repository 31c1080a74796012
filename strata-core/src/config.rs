/// Tunable constants of the canvas core.
/// Hosts load this from JSON; every field falls back to its default.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Maximum number of undo snapshots kept.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Space kept between a container's children and its right/bottom edge.
    #[serde(default = "default_container_padding")]
    pub container_padding: f64,
    /// Extra height reserved for a container's title bar.
    #[serde(default = "default_container_header_height")]
    pub container_header_height: f64,
    /// Offset applied on both axes to duplicated elements.
    #[serde(default = "default_duplicate_offset")]
    pub duplicate_offset: f64,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    #[serde(default)]
    pub default_viewport: Viewport,
    /// Tags that make an element qualify as a task.
    #[serde(default = "default_task_tags")]
    pub task_tags: Vec<String>,
}

fn default_history_capacity() -> usize {
    50
}

fn default_container_padding() -> f64 {
    20.0
}

fn default_container_header_height() -> f64 {
    40.0
}

fn default_duplicate_offset() -> f64 {
    20.0
}

fn default_title_max_chars() -> usize {
    80
}

fn default_task_tags() -> Vec<String> {
    [
        "#todo", "#doing", "#done", "#blocked", "#urgent", "#high", "#medium", "#low", "#bug",
        "#feature", "#task",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            container_padding: default_container_padding(),
            container_header_height: default_container_header_height(),
            duplicate_offset: default_duplicate_offset(),
            title_max_chars: default_title_max_chars(),
            default_viewport: Viewport::default(),
            task_tags: default_task_tags(),
        }
    }
}

/// Load config from path. Returns defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> CanvasConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("[strata.config] Failed to parse config {}: {}", path.display(), e);
            CanvasConfig::default()
        }),
        Err(_) => {
            log::info!("[strata.config] No config at {}, using defaults", path.display());
            CanvasConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{"historyCapacity": 10}"#).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.container_padding, 20.0);
        assert!(config.task_tags.contains(&"#todo".to_string()));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("missing.json"));
        assert_eq!(config, CanvasConfig::default());
    }

    #[test]
    fn test_load_invalid_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), CanvasConfig::default());
    }
}
