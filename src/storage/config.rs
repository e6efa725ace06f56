//! Configuration handling for the outline CLI
//!
//! Two TOML files are read: `.outline/config.toml` inside the project and
//! `config.toml` in the platform config directory (for example
//! `~/.config/outline/`). Missing files and missing sections fall back to
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PasteOptions, DEFAULT_COPY_SUFFIX, DEFAULT_HISTORY_LIMIT};

/// Environment variable that replaces the platform config directory
pub const CONFIG_DIR_ENV: &str = "OUTLINE_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {file}: {message}")]
    Parse { file: String, message: String },
}

/// Undo history settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo entries kept (at least 1)
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HistoryConfig {
    pub fn effective_limit(&self) -> usize {
        self.limit.max(1)
    }
}

/// Clipboard settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Appended to the titles of pasted top-level items
    pub copy_suffix: String,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
        }
    }
}

impl ClipboardConfig {
    pub fn paste_options(&self) -> PasteOptions {
        PasteOptions {
            container_id: None,
            copy_suffix: self.copy_suffix.clone(),
        }
    }
}

/// Settings stored with the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub history: HistoryConfig,
    pub clipboard: ClipboardConfig,
}

/// Per-user settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Used when `--format` is not given
    pub default_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Effective configuration: user settings plus those of the enclosing
/// project, if any
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads the global config and, when run inside a project, its config
    pub fn load() -> Result<Self> {
        match Self::find_project_root() {
            Some(root) => Self::for_project(&root),
            None => Ok(Self {
                project: ProjectConfig::default(),
                global: read_global()?,
                project_root: None,
            }),
        }
    }

    pub fn for_project(project_root: &Path) -> Result<Self> {
        let path = project_root.join(".outline").join("config.toml");
        Ok(Self {
            project: read_toml(&path, "project config")?,
            global: read_global()?,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Platform config directory, unless overridden by `OUTLINE_CONFIG_DIR`
    pub fn global_config_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        ProjectDirs::from("dev", "outline", "outline").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Walks up from the current directory looking for `.outline/`
    pub fn find_project_root() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::find_project_root_from(&cwd)
    }

    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(".outline").is_dir())
            .map(Path::to_path_buf)
    }
}

fn read_global() -> Result<GlobalConfig> {
    match Config::global_config_dir() {
        Some(dir) => read_toml(&dir.join("config.toml"), "global config"),
        None => Ok(GlobalConfig::default()),
    }
}

/// Parses a TOML file; a missing file yields the defaults
fn read_toml<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", what, path.display()))?;
    let parsed = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed)
}
