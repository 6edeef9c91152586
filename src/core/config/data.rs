use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::sidebar::accordion::PanelKey;

pub const DEFAULT_CHAT_FOLDER: &str = "chats";
pub const DEFAULT_ROLE_FOLDER: &str = "roles";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Store directory holding the chat and role folders.
    pub root: Option<PathBuf>,
    pub chat_folder: Option<String>,
    pub role_folder: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    pub default_panel: Option<PanelKey>,
    pub persist_expansion: Option<bool>,
}

impl Config {
    /// Configured root, falling back to `fallback` (usually the data dir).
    pub fn root_or(&self, fallback: &Path) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    pub fn chat_folder(&self) -> &str {
        self.chat_folder
            .as_deref()
            .filter(|folder| !folder.trim().is_empty())
            .unwrap_or(DEFAULT_CHAT_FOLDER)
    }

    pub fn role_folder(&self) -> &str {
        self.role_folder
            .as_deref()
            .filter(|folder| !folder.trim().is_empty())
            .unwrap_or(DEFAULT_ROLE_FOLDER)
    }

    pub fn default_panel(&self) -> PanelKey {
        self.default_panel.unwrap_or(PanelKey::Chats)
    }

    pub fn persist_expansion(&self) -> bool {
        self.persist_expansion.unwrap_or(true)
    }

    /// Applies `key = value` as given on the command line.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        match key {
            "root" => self.root = (!value.is_empty()).then(|| PathBuf::from(value)),
            "chat-folder" | "chat_folder" => self.chat_folder = non_empty(value),
            "role-folder" | "role_folder" => self.role_folder = non_empty(value),
            "models" => {
                self.models = value
                    .split(',')
                    .map(str::trim)
                    .filter(|model| !model.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "default-panel" | "default_panel" => {
                self.default_panel = Some(
                    PanelKey::parse(value)
                        .ok_or_else(|| format!("Unknown panel '{value}' (chats, models, roles)"))?,
                );
            }
            "persist-expansion" | "persist_expansion" => {
                self.persist_expansion = Some(parse_bool(value)?);
            }
            other => return Err(format!("Unknown config key '{other}'")),
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("Expected on/off, got '{value}'")),
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
