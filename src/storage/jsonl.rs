//! JSONL storage for outline items
//!
//! Items are stored in `.outline/items.jsonl` with one JSON object per line.
//! Reads take a shared lock; writes go through a locked temp file that is
//! renamed into place.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::state::write_atomically;
use crate::domain::{DescendantIndex, Item, ItemId, Snapshot};

/// Store for the item list in JSONL format
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".outline").join("items.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole snapshot
    ///
    /// A repeated id replaces the earlier line in place, so hand-appended
    /// edits win.
    pub fn read_snapshot(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            return Ok(Snapshot::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open item store: {}", self.path.display()))?;

        FileExt::lock_shared(&file)
            .context("Failed to acquire read lock on item store")?;

        let reader = BufReader::new(&file);
        let mut items: Vec<Item> = Vec::new();
        let mut seen: HashMap<ItemId, usize> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let item: Item = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse item at line {}", line_num + 1))?;

            match seen.get(&item.id) {
                Some(&pos) => items[pos] = item,
                None => {
                    seen.insert(item.id.clone(), items.len());
                    items.push(item);
                }
            }
        }

        Ok(Snapshot::from_items(items))
    }

    /// Writes the whole snapshot (full rewrite, atomic)
    ///
    /// Items are written in outline order so diffs read top to bottom; items
    /// unreachable from the roots follow in snapshot order.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        write_atomically(&self.path, |out| {
            for item in outline_ordered(snapshot) {
                serde_json::to_writer(&mut *out, item)
                    .with_context(|| format!("Failed to serialize item {}", item.id))?;
                writeln!(out).context("Failed to write item")?;
            }
            Ok(())
        })
    }
}

fn outline_ordered(snapshot: &Snapshot) -> Vec<&Item> {
    let order = DescendantIndex::for_snapshot(snapshot).outline_order();
    let mut out: Vec<&Item> = order.iter().filter_map(|id| snapshot.get(id)).collect();
    if out.len() < snapshot.len() {
        let listed: HashSet<_> = order.iter().collect();
        out.extend(snapshot.iter().filter(|i| !listed.contains(&i.id)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemType;
    use std::fs;
    use tempfile::TempDir;

    fn make_item(id: &str, item_type: ItemType, parent: Option<&str>, order: i64) -> Item {
        let mut item = Item::new(id.parse().unwrap(), item_type, format!("Item {}", id))
            .with_order(order);
        item.parent_id = parent.map(|p| p.parse().unwrap());
        item
    }

    fn sample() -> Snapshot {
        Snapshot::from_items(vec![
            make_item("M2", ItemType::Milestone, None, 2),
            make_item("D1", ItemType::Deliverable, Some("M1"), 1),
            make_item("M1", ItemType::Milestone, None, 1),
        ])
        .renumbered()
    }

    #[test]
    fn read_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        assert!(store.read_snapshot().unwrap().is_empty());
    }

    #[test]
    fn write_and_read_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));

        let snapshot = sample();
        store.write_snapshot(&snapshot).unwrap();
        let loaded = store.read_snapshot().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn writes_in_outline_order() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));
        store.write_snapshot(&sample()).unwrap();

        let ids: Vec<ItemId> = store
            .read_snapshot()
            .unwrap()
            .iter()
            .map(|i| i.id.clone())
            .collect();
        let expected: Vec<ItemId> = ["M1", "D1", "M2"].iter().map(|s| s.parse().unwrap()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn locks_are_shared_on_read_and_released_after_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.jsonl");
        let store = ItemStore::new(&path);
        store.write_snapshot(&sample()).unwrap();
        assert!(!path.with_extension("jsonl.tmp").exists());

        let reader = File::open(&path).unwrap();
        FileExt::lock_shared(&reader).unwrap();
        assert_eq!(store.read_snapshot().unwrap().len(), 3);
        FileExt::unlock(&reader).unwrap();

        let other = File::open(&path).unwrap();
        FileExt::try_lock_exclusive(&other).unwrap();
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn later_lines_replace_earlier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.jsonl");
        let mut first = make_item("M1", ItemType::Milestone, None, 1);
        let line1 = serde_json::to_string(&first).unwrap();
        first.title = "Renamed".into();
        let line2 = serde_json::to_string(&first).unwrap();
        fs::write(&path, format!("{}\n\n{}\n", line1, line2)).unwrap();

        let loaded = ItemStore::new(&path).read_snapshot().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.iter().next().unwrap().title, "Renamed");
    }

    #[test]
    fn bad_line_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.jsonl");
        fs::write(&path, "{not json}\n").unwrap();

        let err = ItemStore::new(&path).read_snapshot().unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("nested").join("dir").join("items.jsonl"));

        store.write_snapshot(&sample()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn atomic_write() {
        let dir = TempDir::new().unwrap();
        let store = ItemStore::new(dir.path().join("items.jsonl"));
        store.write_snapshot(&sample()).unwrap();

        let temp_path = store.path().with_extension("jsonl.tmp");
        assert!(!temp_path.exists());
    }
}
