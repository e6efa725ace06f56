//! Session state documents
//!
//! Undo history and the clipboard live in single JSON files under
//! `.outline/`. They are session state, ignored by git, and rewritten whole
//! on every change.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A JSON document of type `T` stored at a fixed path
pub struct StateFile<T> {
    path: PathBuf,
    _doc: PhantomData<T>,
}

impl<T> StateFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document; `None` when the file does not exist
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        FileExt::lock_shared(&file)
            .with_context(|| format!("Failed to acquire read lock on {}", self.path.display()))?;

        let doc = serde_json::from_reader(BufReader::new(&file))
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(doc))
    }

    /// Writes the document atomically
    pub fn save(&self, doc: &T) -> Result<()> {
        write_atomically(&self.path, |out| {
            serde_json::to_writer_pretty(&mut *out, doc)
                .with_context(|| format!("Failed to serialize {}", self.path.display()))?;
            writeln!(out).context("Failed to write state file")
        })
    }

    /// Deletes the document; returns false if there was none
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

impl<T> StateFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn load_or_default(&self) -> Result<T> {
        Ok(self.load()?.unwrap_or_default())
    }
}

/// Writes `path` through a locked `<ext>.tmp` sibling, then renames it over
/// the target
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let temp_path = path.with_extension(format!("{}.tmp", ext));
    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("Failed to lock {}", temp_path.display()))?;

        let mut writer = BufWriter::new(&file);
        write(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to move {} into place", temp_path.display()))
}
