//! Read-operate-write glue shared by the structural commands
//!
//! One command is one atomic unit: the whole snapshot is read, a single
//! domain operation runs, and the whole new snapshot is written before the
//! history entry is recorded.

use anyhow::Result;
use tracing::debug;

use crate::domain::{Applied, HashIds, HistoryEntry, Snapshot};
use crate::storage::Project;

pub struct Session {
    project: Project,
    snapshot: Snapshot,
}

impl Session {
    /// Opens the project around the current directory and reads its items
    pub fn open() -> Result<Self> {
        let project = Project::open_current()?;
        let snapshot = project.item_store().read_snapshot()?;
        debug!(items = snapshot.len(), root = %project.root().display(), "session opened");
        Ok(Self { project, snapshot })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Id generator that avoids every id already in the snapshot
    pub fn ids(&self) -> HashIds {
        HashIds::avoiding(self.snapshot.iter().map(|i| &i.id))
    }

    /// Persists the new snapshot and records its entry for undo
    ///
    /// No-op entries are neither written nor recorded.
    pub fn commit(&mut self, applied: Applied) -> Result<HistoryEntry> {
        let Applied { snapshot, entry } = applied;
        if entry.is_noop() {
            debug!(label = %entry.label, "nothing changed");
            return Ok(entry);
        }

        self.project.item_store().write_snapshot(&snapshot)?;
        self.snapshot = snapshot;

        let mut history = self.project.load_history()?;
        history.push(entry.clone());
        self.project.history_file().save(&history)?;
        debug!(label = %entry.label, undo = history.undo_len(), "committed");
        Ok(entry)
    }

    /// Writes a snapshot produced by undo or redo; history is saved by the
    /// caller
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.project.item_store().write_snapshot(&snapshot)?;
        self.snapshot = snapshot;
        Ok(())
    }
}
