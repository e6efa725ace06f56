//! Clipboard transform
//!
//! `copy` captures a selection as a nested forest so paste can rebuild parent
//! links without the source snapshot. `prepare_for_paste` clones that forest
//! with fresh ids in two passes:
//!
//! 1. depth-first, parents before children, assigning new ids and building
//!    the `old -> new` map
//! 2. once every id is mapped, rewriting predecessor links that point inside
//!    the copied set
//!
//! Links that point outside the copied set are kept as they are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::error::OutlineError;
use super::history::{Action, Applied, HistoryEntry};
use super::id::{IdGenerator, ItemId};
use super::index::DescendantIndex;
use super::placement::{self, DropPosition};
use super::reposition::{insertion_index, PlanBuilder};
use super::snapshot::Snapshot;
use super::edit;
use super::tree::{self, TreeNode};

pub const DEFAULT_COPY_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardMode {
    #[default]
    Copy,
    Cut,
}

impl ClipboardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardMode::Copy => "copy",
            ClipboardMode::Cut => "cut",
        }
    }
}

/// A copied sub-forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub mode: ClipboardMode,
    pub roots: Vec<TreeNode>,
    /// Top-level source ids of a cut, deleted by the caller after a paste
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ids: Vec<ItemId>,
    pub copied_at: DateTime<Utc>,
}

impl ClipboardPayload {
    /// Total number of items, descendants included
    pub fn len(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn is_cut(&self) -> bool {
        self.mode == ClipboardMode::Cut
    }

    /// Turns a cut into a plain copy once its sources are gone
    pub fn into_copy(mut self) -> Self {
        self.mode = ClipboardMode::Copy;
        self.source_ids.clear();
        self
    }
}

/// Captures `selection` and all its descendants
///
/// Selected items nested under other selected items are folded into their
/// ancestor's subtree.
pub fn copy(
    snapshot: &Snapshot,
    selection: &[ItemId],
    mode: ClipboardMode,
) -> Result<ClipboardPayload, OutlineError> {
    for id in selection {
        snapshot.require(id)?;
    }
    let index = DescendantIndex::for_snapshot(snapshot);
    let tops = index.top_level(selection);
    let roots: Vec<TreeNode> = tops
        .iter()
        .filter_map(|id| tree::build_subtree(id, snapshot, &index))
        .collect();

    debug!(roots = roots.len(), mode = mode.as_str(), "copy");
    Ok(ClipboardPayload {
        mode,
        roots,
        source_ids: match mode {
            ClipboardMode::Cut => tops,
            ClipboardMode::Copy => Vec::new(),
        },
        copied_at: Utc::now(),
    })
}

/// Settings applied to every paste
#[derive(Debug, Clone, PartialEq)]
pub struct PasteOptions {
    /// Container the clones move into; `None` keeps each source's container
    pub container_id: Option<String>,
    /// Appended to the title of each pasted root
    pub copy_suffix: String,
}

impl Default for PasteOptions {
    fn default() -> Self {
        Self {
            container_id: None,
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
        }
    }
}

/// Cloned forest plus the `old -> new` id map
#[derive(Debug, Clone)]
pub struct PastedForest {
    pub roots: Vec<TreeNode>,
    pub id_map: HashMap<ItemId, ItemId>,
}

/// Clones the payload with fresh ids, ready to insert under `new_parent`
pub fn prepare_for_paste(
    payload: &ClipboardPayload,
    new_parent: Option<&ItemId>,
    options: &PasteOptions,
    ids: &mut impl IdGenerator,
) -> PastedForest {
    let mut id_map = HashMap::new();
    let mut roots: Vec<TreeNode> = payload
        .roots
        .iter()
        .map(|root| {
            let mut clone = clone_node(root, new_parent.cloned(), options, ids, &mut id_map);
            clone.item.title.push_str(&options.copy_suffix);
            clone
        })
        .collect();

    // Second pass: every id is mapped now
    let mut stack: Vec<&mut TreeNode> = roots.iter_mut().collect();
    while let Some(node) = stack.pop() {
        for link in &mut node.item.predecessors {
            if let Some(new_id) = id_map.get(&link.item) {
                link.item = new_id.clone();
            }
        }
        stack.extend(node.children.iter_mut());
    }

    PastedForest { roots, id_map }
}

fn clone_node(
    node: &TreeNode,
    parent: Option<ItemId>,
    options: &PasteOptions,
    ids: &mut impl IdGenerator,
    id_map: &mut HashMap<ItemId, ItemId>,
) -> TreeNode {
    let new_id = ids.next_id(node.item.id.as_str());
    id_map.insert(node.item.id.clone(), new_id.clone());

    let mut item = node.item.clone();
    item.id = new_id.clone();
    item.parent_id = parent;
    item.reset_transient();
    if let Some(container) = &options.container_id {
        item.container_id = Some(container.clone());
    }

    let children = node
        .children
        .iter()
        .map(|child| clone_node(child, Some(new_id.clone()), options, ids, id_map))
        .collect();
    TreeNode { item, children }
}

/// Result of a paste
#[derive(Debug, Clone)]
pub struct Pasted {
    pub applied: Applied,
    pub id_map: HashMap<ItemId, ItemId>,
    /// New ids of the pasted roots, in paste order
    pub roots: Vec<ItemId>,
}

/// Validates and inserts the payload at (`target`, `position`)
///
/// The pasted roots are checked against the resolved parent like a drop.
/// For a cut, the target may not lie inside the cut sources, since those are
/// deleted once the paste lands.
pub fn paste(
    snapshot: &Snapshot,
    payload: &ClipboardPayload,
    target: Option<&ItemId>,
    position: DropPosition,
    options: &PasteOptions,
    ids: &mut impl IdGenerator,
) -> Result<Pasted, OutlineError> {
    let index = DescendantIndex::for_snapshot(snapshot);
    if let Some(target) = target {
        snapshot.require(target)?;
        if payload.is_cut() {
            placement::check_target(&payload.source_ids, target, &index)?;
        }
    }
    let parent = placement::resolve_parent(target, position, snapshot)?;
    let parent_type = parent.as_ref().and_then(|p| snapshot.get(p)).map(|p| p.item_type);
    placement::validate_types(
        payload.roots.iter().map(|n| (&n.item.id, n.item.item_type)),
        parent_type,
    )
    .inspect_err(|e| debug!(reason = %e, "paste refused"))?;

    let mut forest = prepare_for_paste(payload, parent.as_ref(), options, ids);
    let new_roots: Vec<ItemId> = forest.roots.iter().map(|n| n.item.id.clone()).collect();

    let mut group = index.children_of(parent.as_ref()).to_vec();
    let at = insertion_index(&group, target, position);
    group.splice(at..at, new_roots.iter().cloned());
    for (offset, root) in forest.roots.iter_mut().enumerate() {
        root.item.sort_order = (at + offset) as i64 + 1;
    }

    let mut plan = PlanBuilder::new(snapshot);
    plan.set_group(parent.as_ref(), &group);
    let reordered = plan.finish();

    let items = tree::flatten(&forest.roots);
    let mut next = snapshot.clone();
    for change in &reordered {
        next.update(&change.id, |i| i.set_position(&change.after));
    }
    for item in &items {
        next.upsert(item.clone());
    }

    debug!(items = items.len(), roots = new_roots.len(), "paste");
    let label = format!("paste {} items", items.len());
    Ok(Pasted {
        applied: Applied {
            snapshot: next.renumbered(),
            entry: HistoryEntry::new(Action::Create { items, reordered }, label),
        },
        id_map: forest.id_map,
        roots: new_roots,
    })
}

/// Deletes the sources of a cut after its paste succeeded
///
/// Sources already gone from the snapshot are skipped; `None` when nothing is
/// left to delete or the payload is not a cut.
pub fn remove_cut_sources(
    snapshot: &Snapshot,
    payload: &ClipboardPayload,
) -> Result<Option<Applied>, OutlineError> {
    if !payload.is_cut() {
        return Ok(None);
    }
    let present: Vec<ItemId> = payload
        .source_ids
        .iter()
        .filter(|id| snapshot.contains(id))
        .cloned()
        .collect();
    if present.is_empty() {
        return Ok(None);
    }
    edit::remove_items(snapshot, &present).map(Some)
}
