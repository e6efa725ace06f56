//! Item domain model
//!
//! Items are the nodes of the outline: milestones at the root, deliverables
//! under milestones, tasks under deliverables or other tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::ItemId;

/// Level of an item in the fixed type hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Milestone,
    Deliverable,
    Task,
}

impl ItemType {
    pub const ALL: [ItemType; 3] = [ItemType::Milestone, ItemType::Deliverable, ItemType::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Milestone => "milestone",
            ItemType::Deliverable => "deliverable",
            ItemType::Task => "task",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "milestone" | "m" => Ok(ItemType::Milestone),
            "deliverable" | "d" => Ok(ItemType::Deliverable),
            "task" | "t" | "subtask" => Ok(ItemType::Task),
            other => Err(format!("unknown item type '{}'", other)),
        }
    }
}

/// Scheduling relationship of a predecessor link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PredecessorKind {
    /// Successor starts after the predecessor finishes
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl PredecessorKind {
    pub fn label(&self) -> &'static str {
        match self {
            PredecessorKind::FinishToStart => "FS",
            PredecessorKind::StartToStart => "SS",
            PredecessorKind::FinishToFinish => "FF",
            PredecessorKind::StartToFinish => "SF",
        }
    }
}

impl FromStr for PredecessorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS" => Ok(PredecessorKind::FinishToStart),
            "SS" => Ok(PredecessorKind::StartToStart),
            "FF" => Ok(PredecessorKind::FinishToFinish),
            "SF" => Ok(PredecessorKind::StartToFinish),
            other => Err(format!("unknown predecessor kind '{}'", other)),
        }
    }
}

/// A dependency link to another item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predecessor {
    /// The item this one depends on
    #[serde(rename = "ref")]
    pub item: ItemId,
    #[serde(default)]
    pub kind: PredecessorKind,
    /// Lag in days, may be negative (lead)
    #[serde(default)]
    pub lag: i32,
}

impl Predecessor {
    /// Creates a finish-to-start link with no lag
    pub fn finish_to_start(item: ItemId) -> Self {
        Self {
            item,
            kind: PredecessorKind::FinishToStart,
            lag: 0,
        }
    }
}

/// Progress state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::NotStarted => "not_started",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Done => "done",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ItemStatus::Done)
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "not_started" | "todo" => Ok(ItemStatus::NotStarted),
            "in_progress" => Ok(ItemStatus::InProgress),
            "done" => Ok(ItemStatus::Done),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Structural placement of an item: everything a move can change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub parent_id: Option<ItemId>,
    pub sort_order: i64,
    pub item_type: ItemType,
}

fn is_zero(val: &u8) -> bool {
    *val == 0
}

fn is_false(val: &bool) -> bool {
    !*val
}

/// A node of the outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    /// Owning item, `None` at the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,

    pub item_type: ItemType,

    pub title: String,

    /// Rank among siblings
    #[serde(default)]
    pub sort_order: i64,

    /// Derived outline number, recomputed by the WBS pass
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wbs_number: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predecessors: Vec<Predecessor>,

    /// Project or board the item lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    /// Percent complete, 0..=100
    #[serde(default, skip_serializing_if = "is_zero")]
    pub progress: u8,

    /// External publication this item is linked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_to: Option<String>,

    /// Collapsed in the outline view
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates a root-level item with sort order 0
    pub fn new(id: ItemId, item_type: ItemType, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: None,
            item_type,
            title: title.into(),
            sort_order: 0,
            wbs_number: String::new(),
            predecessors: Vec::new(),
            container_id: None,
            status: ItemStatus::NotStarted,
            progress: 0,
            published_to: None,
            collapsed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn position(&self) -> Position {
        Position {
            parent_id: self.parent_id.clone(),
            sort_order: self.sort_order,
            item_type: self.item_type,
        }
    }

    pub fn set_position(&mut self, position: &Position) {
        self.parent_id = position.parent_id.clone();
        self.sort_order = position.sort_order;
        self.item_type = position.item_type;
    }

    /// Adds a predecessor link, ignoring exact duplicates
    pub fn add_predecessor(&mut self, predecessor: Predecessor) -> bool {
        if self
            .predecessors
            .iter()
            .any(|p| p.item == predecessor.item && p.kind == predecessor.kind)
        {
            return false;
        }
        self.predecessors.push(predecessor);
        self.updated_at = Utc::now();
        true
    }

    /// Removes every link to `item`
    pub fn remove_predecessor(&mut self, item: &ItemId) -> bool {
        let len_before = self.predecessors.len();
        self.predecessors.retain(|p| &p.item != item);
        let removed = self.predecessors.len() != len_before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Resets progress, status, publication, collapse flag and timestamps
    /// to what a freshly created item has
    pub fn reset_transient(&mut self) {
        let now = Utc::now();
        self.status = ItemStatus::NotStarted;
        self.progress = 0;
        self.published_to = None;
        self.collapsed = false;
        self.wbs_number.clear();
        self.created_at = now;
        self.updated_at = now;
    }
}

/// Input for creating a new item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub item_type: ItemType,
    pub title: String,
    #[serde(default)]
    pub container_id: Option<String>,
}

impl NewItem {
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        Self {
            item_type,
            title: title.into(),
            container_id: None,
        }
    }
}

/// Input for updating an item. Structure fields are changed only through
/// the reposition engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItem {
    pub title: Option<String>,
    pub status: Option<ItemStatus>,
    /// Clamped to 100
    pub progress: Option<u8>,
    pub collapsed: Option<bool>,
    pub published_to: Option<String>,
}

impl UpdateItem {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.collapsed.is_none()
            && self.published_to.is_none()
    }

    /// Applies the update; returns true if any field changed
    pub fn apply_to(&self, item: &mut Item) -> bool {
        let before = item.clone();
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(progress) = self.progress {
            item.progress = progress.min(100);
        }
        if let Some(collapsed) = self.collapsed {
            item.collapsed = collapsed;
        }
        if let Some(published) = &self.published_to {
            item.published_to = Some(published.clone());
        }
        let changed = *item != before;
        if changed {
            item.updated_at = Utc::now();
        }
        changed
    }
}
