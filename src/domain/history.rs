//! Undo/redo log
//!
//! Entries record intent plus enough data to reverse it, never whole
//! snapshots: a move carries the before/after placement of every item it
//! touched, a create carries the created items, and so on. `revert` and
//! `reapply` only need the current snapshot.
//!
//! History is linear. Pushing after an undo discards the redo branch, and the
//! undo stack is capped (default 50) by evicting the oldest entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::error::OutlineError;
use super::id::ItemId;
use super::item::{Item, Position};
use super::snapshot::Snapshot;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Placement of one item before and after an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChange {
    pub id: ItemId,
    pub before: Position,
    pub after: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Move,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Move => "move",
        }
    }
}

/// A reversible action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// Items added, plus siblings whose order shifted to make room
    Create {
        items: Vec<Item>,
        #[serde(default)]
        reordered: Vec<PositionChange>,
    },
    /// Field edits; structure untouched
    Update { before: Vec<Item>, after: Vec<Item> },
    /// Items removed, plus siblings re-linearized after the gap
    Delete {
        items: Vec<Item>,
        #[serde(default)]
        reordered: Vec<PositionChange>,
    },
    Move { changes: Vec<PositionChange> },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Create { .. } => ActionKind::Create,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Move { .. } => ActionKind::Move,
        }
    }

    /// Ids of the items the action is about (not incidental reorders)
    pub fn item_ids(&self) -> Vec<ItemId> {
        match self {
            Action::Create { items, .. } | Action::Delete { items, .. } => {
                items.iter().map(|i| i.id.clone()).collect()
            }
            Action::Update { after, .. } => after.iter().map(|i| i.id.clone()).collect(),
            Action::Move { changes } => changes.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: Action,
    /// Short human description, e.g. `promote D1`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(action: Action, label: impl Into<String>) -> Self {
        Self {
            action,
            label: label.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// True when applying the entry changes nothing
    pub fn is_noop(&self) -> bool {
        match &self.action {
            Action::Create { items, .. } | Action::Delete { items, .. } => items.is_empty(),
            Action::Update { before, after } => before == after,
            Action::Move { changes } => changes.is_empty(),
        }
    }

    /// Returns `snapshot` with this action undone
    pub fn revert(&self, snapshot: &Snapshot) -> Result<Snapshot, OutlineError> {
        let mut next = snapshot.clone();
        match &self.action {
            Action::Create { items, reordered } => {
                remove_present(&mut next, items)?;
                apply_positions(&mut next, reordered, |c| &c.before)?;
            }
            Action::Update { before, .. } => replace_present(&mut next, before)?,
            Action::Delete { items, reordered } => {
                for item in items {
                    next.upsert(item.clone());
                }
                apply_positions(&mut next, reordered, |c| &c.before)?;
            }
            Action::Move { changes } => apply_positions(&mut next, changes, |c| &c.before)?,
        }
        Ok(next.renumbered())
    }

    /// Returns `snapshot` with this action applied again
    pub fn reapply(&self, snapshot: &Snapshot) -> Result<Snapshot, OutlineError> {
        let mut next = snapshot.clone();
        match &self.action {
            Action::Create { items, reordered } => {
                for item in items {
                    next.upsert(item.clone());
                }
                apply_positions(&mut next, reordered, |c| &c.after)?;
            }
            Action::Update { after, .. } => replace_present(&mut next, after)?,
            Action::Delete { items, reordered } => {
                remove_present(&mut next, items)?;
                apply_positions(&mut next, reordered, |c| &c.after)?;
            }
            Action::Move { changes } => apply_positions(&mut next, changes, |c| &c.after)?,
        }
        Ok(next.renumbered())
    }
}

fn apply_positions<F>(
    snapshot: &mut Snapshot,
    changes: &[PositionChange],
    pick: F,
) -> Result<(), OutlineError>
where
    F: Fn(&PositionChange) -> &Position,
{
    for change in changes {
        let position = pick(change);
        if !snapshot.update(&change.id, |item| item.set_position(position)) {
            return Err(OutlineError::NotFound(change.id.clone()));
        }
    }
    Ok(())
}

fn replace_present(snapshot: &mut Snapshot, items: &[Item]) -> Result<(), OutlineError> {
    for item in items {
        if !snapshot.update(&item.id, |current| *current = item.clone()) {
            return Err(OutlineError::NotFound(item.id.clone()));
        }
    }
    Ok(())
}

fn remove_present(snapshot: &mut Snapshot, items: &[Item]) -> Result<(), OutlineError> {
    if let Some(missing) = items.iter().find(|i| !snapshot.contains(&i.id)) {
        return Err(OutlineError::NotFound(missing.id.clone()));
    }
    let ids: HashSet<ItemId> = items.iter().map(|i| i.id.clone()).collect();
    snapshot.remove_all(&ids);
    Ok(())
}

/// Result of a structural operation: the new snapshot and the entry that
/// reverses it
#[derive(Debug, Clone)]
pub struct Applied {
    pub snapshot: Snapshot,
    pub entry: HistoryEntry,
}

/// Bounded linear undo/redo stacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    limit: usize,
    /// Past actions, most recent last
    undo: VecDeque<HistoryEntry>,
    /// Undone actions, most recent last
    redo: Vec<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log keeping at most `limit` undo entries (at least 1)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the cap, evicting the oldest entries if needed
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.evict();
    }

    fn evict(&mut self) {
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Records a new action and discards the redo branch
    pub fn push(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        self.redo.clear();
        self.evict();
    }

    /// Pops the most recent action for reversal
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo.pop_back()?;
        self.redo.push(entry.clone());
        Some(entry)
    }

    /// Pops the most recently undone action for reapplication
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push_back(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.undo.iter()
    }

    /// Redo entries, next-to-redo last
    pub fn redo_entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.redo.iter()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
