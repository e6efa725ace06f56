//! Working snapshot of the outline
//!
//! A snapshot is the flat item list handed in by the calling layer. Operations
//! never mutate the caller's snapshot: they clone, change the clone and hand it
//! back together with a history entry.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::{MalformedSnapshot, OutlineError};
use super::hierarchy;
use super::id::ItemId;
use super::item::{Item, ItemType};
use super::wbs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Item>", into = "Vec<Item>")]
pub struct Snapshot {
    items: Vec<Item>,
    /// Position of each id in `items`; first occurrence wins on duplicates
    index: HashMap<ItemId, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        let mut snapshot = Self {
            items,
            index: HashMap::new(),
        };
        snapshot.reindex();
        snapshot
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, item) in self.items.iter().enumerate() {
            self.index.entry(item.id.clone()).or_insert(i);
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Like [`get`](Self::get), but a missing id is an error
    pub fn require(&self, id: &ItemId) -> Result<&Item, OutlineError> {
        self.get(id).ok_or_else(|| OutlineError::NotFound(id.clone()))
    }

    /// Type of the item's parent, `None` for root items
    pub fn parent_type(&self, item: &Item) -> Option<ItemType> {
        item.parent_id
            .as_ref()
            .and_then(|p| self.get(p))
            .map(|p| p.item_type)
    }

    /// Mutates one item in place; returns false if the id is absent
    pub fn update<F>(&mut self, id: &ItemId, f: F) -> bool
    where
        F: FnOnce(&mut Item),
    {
        match self.index.get(id) {
            Some(&i) => {
                f(&mut self.items[i]);
                true
            }
            None => false,
        }
    }

    /// Appends an item, replacing any item with the same id
    pub fn upsert(&mut self, item: Item) {
        match self.index.get(&item.id) {
            Some(&i) => self.items[i] = item,
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Removes the given ids, returning the removed items in snapshot order
    pub fn remove_all(&mut self, ids: &HashSet<ItemId>) -> Vec<Item> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| ids.contains(&item.id));
        self.items = kept;
        self.reindex();
        removed
    }

    /// Recomputes every WBS number
    pub fn renumber(&mut self) {
        let numbers = wbs::wbs_numbers(&self.items);
        for item in &mut self.items {
            item.wbs_number = numbers.get(&item.id).cloned().unwrap_or_default();
        }
    }

    pub fn renumbered(mut self) -> Self {
        self.renumber();
        self
    }

    /// Verifies unique ids, existing parents, acyclic parent chains and the
    /// type table. Reports the first problem found.
    pub fn check_invariants(&self) -> Result<(), OutlineError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(&item.id) {
                return Err(MalformedSnapshot::DuplicateId(item.id.clone()).into());
            }
        }

        for item in &self.items {
            if let Some(parent) = &item.parent_id {
                if !self.contains(parent) {
                    return Err(MalformedSnapshot::MissingParent {
                        item: item.id.clone(),
                        parent: parent.clone(),
                    }
                    .into());
                }
            }
        }

        for item in &self.items {
            let mut current = item.parent_id.as_ref();
            let mut steps = 0;
            while let Some(parent) = current {
                if parent == &item.id || steps > self.items.len() {
                    return Err(MalformedSnapshot::ParentCycle {
                        item: item.id.clone(),
                    }
                    .into());
                }
                steps += 1;
                current = self.get(parent).and_then(|p| p.parent_id.as_ref());
            }
        }

        for item in &self.items {
            hierarchy::validate_placement(item.item_type, self.parent_type(item))
                .map_err(|e| e.for_item(&item.id))?;
        }

        Ok(())
    }
}

impl From<Vec<Item>> for Snapshot {
    fn from(items: Vec<Item>) -> Self {
        Self::from_items(items)
    }
}

impl From<Snapshot> for Vec<Item> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.items
    }
}

impl FromIterator<Item> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

/// Two snapshots are equal when they hold the same items, whatever the flat order
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .all(|item| other.get(&item.id) == Some(item))
    }
}
