/// Configuration for the strata CLI.
/// Reads config.json from ~/.config/strata/config.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use strata_core::config::CanvasConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Document used when no path is given on the command line.
    #[serde(default)]
    pub document: Option<String>,
    #[serde(flatten)]
    pub canvas: CanvasConfig,
}

/// Default config path: ~/.config/strata/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strata")
        .join("config.json")
}

/// Load config from path. Returns default if file doesn't exist.
pub fn load_config(path: &Path) -> CliConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("[strata.cli.config] Failed to parse config {}: {}", path.display(), e);
            CliConfig::default()
        }),
        Err(_) => {
            log::info!("[strata.cli.config] No config at {}, using defaults", path.display());
            CliConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_canvas_settings() {
        let config: CliConfig =
            serde_json::from_str(r#"{"document": "/tmp/a.json", "titleMaxChars": 40}"#).unwrap();
        assert_eq!(config.document.as_deref(), Some("/tmp/a.json"));
        assert_eq!(config.canvas.title_max_chars, 40);
        assert_eq!(config.canvas.history_capacity, 50);
    }

    #[test]
    fn test_default_path_ends_with_strata_config() {
        let path = default_config_path();
        assert!(path.ends_with("strata/config.json"));
    }
}
