//! # Storage Layer
//!
//! Git-friendly persistence for outline projects.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Items | JSONL (one JSON per line) | `.outline/items.jsonl` |
//! | Config | TOML | `.outline/config.toml` |
//! | Undo history | JSON | `.outline/history.json` |
//! | Clipboard | JSON | `.outline/clipboard.json` |
//!
//! All writes are atomic (temp file + rename) under an exclusive `fs2` lock.
//! History and clipboard are session state and ignored by git.

mod config;
mod jsonl;
mod project;
mod state;

pub use config::{ClipboardConfig, Config, ConfigError, GlobalConfig, HistoryConfig, OutputFormat, ProjectConfig};
pub use jsonl::ItemStore;
pub use project::{Project, ProjectError};
pub use state::StateFile;
