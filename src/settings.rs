use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub data_file: String,
    pub icons_dir: PathBuf,
    pub default_icon: String,
    pub queued_saves: bool,
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            data_file: "bookmarks-data.json".to_string(),
            icons_dir: PathBuf::from("data/icons"),
            default_icon: "data/icons/default.png".to_string(),
            queued_saves: true,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file)
    }

    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Atomic write: tmp, then rename.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;

        Ok(())
    }
}
