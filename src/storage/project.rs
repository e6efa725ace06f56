//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::{Config, ItemStore, StateFile};
use crate::domain::{ClipboardPayload, History};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in an outline project. Run 'outline init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# outline project configuration

[history]
# Number of undo steps kept
limit = 50

[clipboard]
# Appended to the titles of pasted top-level items
copy_suffix = " (Copy)"
"#;

const GITIGNORE: &str = r#"# Session state, not shared
history.json
clipboard.json
*.tmp
"#;

/// An outline project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(".outline").is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;
        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;
        Self::open(root)
    }

    /// Initializes a new project at the given path; existing files are kept
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let outline_dir = root.join(".outline");

        fs::create_dir_all(&outline_dir).with_context(|| {
            format!("Failed to create .outline directory: {}", outline_dir.display())
        })?;

        let config_path = outline_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = outline_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let items_path = outline_dir.join("items.jsonl");
        if !items_path.exists() {
            fs::write(&items_path, "")
                .with_context(|| format!("Failed to create {}", items_path.display()))?;
        }

        info!(root = %root.display(), "initialized project");
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .outline directory path
    pub fn outline_dir(&self) -> PathBuf {
        self.root.join(".outline")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn item_store(&self) -> ItemStore {
        ItemStore::for_project(&self.root)
    }

    pub fn history_file(&self) -> StateFile<History> {
        StateFile::new(self.outline_dir().join("history.json"))
    }

    pub fn clipboard_file(&self) -> StateFile<ClipboardPayload> {
        StateFile::new(self.outline_dir().join("clipboard.json"))
    }

    /// Loads the undo history, applying the configured limit
    pub fn load_history(&self) -> Result<History> {
        let mut history = self.history_file().load_or_default()?;
        history.set_limit(self.config.project.history.effective_limit());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.outline_dir().is_dir());
        assert!(project.outline_dir().join("config.toml").is_file());
        assert!(project.outline_dir().join("items.jsonl").is_file());

        let gitignore = fs::read_to_string(project.outline_dir().join(".gitignore")).unwrap();
        assert!(gitignore.contains("history.json"));
        assert!(gitignore.contains("clipboard.json"));
    }

    #[test]
    fn default_config_parses() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();
        assert_eq!(project.config().project.history.limit, 50);
        assert_eq!(project.config().project.clipboard.copy_suffix, " (Copy)");
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        fs::write(
            dir.path().join(".outline").join("config.toml"),
            "[history]\nlimit = 3\n",
        )
        .unwrap();

        let project = Project::init(dir.path()).unwrap();
        assert_eq!(project.config().project.history.limit, 3);
    }

    #[test]
    fn open_non_project_fails() {
        let dir = TempDir::new().unwrap();
        let err = Project::open(dir.path()).err().unwrap();
        assert!(err.to_string().contains("outline init"));
    }

    #[test]
    fn stores_are_accessible() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.item_store().path().ends_with("items.jsonl"));
        assert!(project.history_file().path().ends_with("history.json"));
        assert!(project.clipboard_file().path().ends_with("clipboard.json"));
    }

    #[test]
    fn history_limit_comes_from_config() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        fs::write(
            dir.path().join(".outline").join("config.toml"),
            "[history]\nlimit = 2\n",
        )
        .unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.load_history().unwrap().limit(), 2);
    }
}
