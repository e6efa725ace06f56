//! Reposition engine: drag-drop, promote, demote, keyboard up/down
//!
//! Each operation is split into a `plan_*` step that validates against the
//! snapshot and computes the new placements, and an apply step that produces
//! the new snapshot plus a `Move` history entry. `check_*` runs the plan step
//! only.
//!
//! Every sibling group touched by an operation is re-linearized to
//! `1..=n`, so ranks stay dense and monotonic.

use std::collections::HashMap;
use tracing::debug;

use super::error::{BoundaryViolation, OutlineError};
use super::hierarchy;
use super::history::{Action, Applied, HistoryEntry, PositionChange};
use super::id::ItemId;
use super::index::DescendantIndex;
use super::item::{ItemType, Position};
use super::placement::{self, DropPosition};
use super::snapshot::Snapshot;

/// Validated placement changes, ready to apply
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub changes: Vec<PositionChange>,
    pub label: String,
}

impl MovePlan {
    /// True when nothing would actually move
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply(&self, snapshot: &Snapshot) -> Applied {
        let mut next = snapshot.clone();
        for change in &self.changes {
            next.update(&change.id, |item| item.set_position(&change.after));
        }
        Applied {
            snapshot: next.renumbered(),
            entry: HistoryEntry::new(
                Action::Move {
                    changes: self.changes.clone(),
                },
                self.label.clone(),
            ),
        }
    }
}

/// Accumulates new positions and emits only the ones that differ
pub(crate) struct PlanBuilder<'a> {
    snapshot: &'a Snapshot,
    after: HashMap<ItemId, Position>,
    touched: Vec<ItemId>,
}

impl<'a> PlanBuilder<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            after: HashMap::new(),
            touched: Vec::new(),
        }
    }

    fn position_mut(&mut self, id: &ItemId) -> Option<&mut Position> {
        if !self.after.contains_key(id) {
            let position = self.snapshot.get(id)?.position();
            self.after.insert(id.clone(), position);
            self.touched.push(id.clone());
        }
        self.after.get_mut(id)
    }

    /// Places `ids` under `parent` with sort orders `1..=n`. Ids absent from
    /// the snapshot (items being created) are skipped.
    pub(crate) fn set_group(&mut self, parent: Option<&ItemId>, ids: &[ItemId]) {
        for (rank, id) in ids.iter().enumerate() {
            if let Some(position) = self.position_mut(id) {
                position.parent_id = parent.cloned();
                position.sort_order = rank as i64 + 1;
            }
        }
    }

    fn set_order(&mut self, id: &ItemId, sort_order: i64) {
        if let Some(position) = self.position_mut(id) {
            position.sort_order = sort_order;
        }
    }

    pub(crate) fn set_type(&mut self, id: &ItemId, item_type: ItemType) {
        if let Some(position) = self.position_mut(id) {
            position.item_type = item_type;
        }
    }

    pub(crate) fn finish(self) -> Vec<PositionChange> {
        let mut after = self.after;
        self.touched
            .into_iter()
            .filter_map(|id| {
                let before = self.snapshot.get(&id)?.position();
                let after = after.remove(&id)?;
                (before != after).then_some(PositionChange { id, before, after })
            })
            .collect()
    }
}

/// Index in `group` where an item dropped at (`target`, `position`) lands
///
/// `group` is the destination sibling list with the moving items already
/// removed. `After` lands at target rank + 1, which in a sibling list is
/// already past the target's whole subtree.
pub(crate) fn insertion_index(
    group: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
) -> usize {
    let rank = target.and_then(|t| group.iter().position(|id| id == t));
    match (position, rank) {
        (DropPosition::Before, Some(rank)) => rank,
        (DropPosition::After, Some(rank)) => rank + 1,
        _ => group.len(),
    }
}

/// Children of `parent` minus the ids in `excluded`
pub(crate) fn group_without(
    index: &DescendantIndex,
    parent: Option<&ItemId>,
    excluded: &[ItemId],
) -> Vec<ItemId> {
    index
        .children_of(parent)
        .iter()
        .filter(|id| !excluded.contains(id))
        .cloned()
        .collect()
}

/// Re-linearizes every sibling group the `moved` items leave
///
/// Run before setting the destination group, which then overrides any
/// placement computed here.
pub(crate) fn close_gaps(plan: &mut PlanBuilder<'_>, index: &DescendantIndex, moved: &[ItemId]) {
    let mut seen: Vec<Option<&ItemId>> = Vec::new();
    for id in moved {
        let parent = index.parent_of(id);
        if seen.contains(&parent) {
            continue;
        }
        seen.push(parent);
        plan.set_group(parent, &group_without(index, parent, moved));
    }
}

fn describe(ids: &[ItemId]) -> String {
    match ids {
        [one] => one.to_string(),
        many => format!("{} items", many.len()),
    }
}

// Drag-drop

/// Validates a drop without computing it
pub fn check_drag_drop(
    snapshot: &Snapshot,
    dragged: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
) -> Result<(), OutlineError> {
    placement::validate_placement(dragged, target, position, snapshot)
}

pub fn plan_drag_drop(
    snapshot: &Snapshot,
    dragged: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
) -> Result<MovePlan, OutlineError> {
    let index = DescendantIndex::for_snapshot(snapshot);
    let new_parent = placement::check(dragged, target, position, snapshot, &index)?;

    // Descendants ride along with their top-level ancestor
    let tops = index.top_level(dragged);

    let mut group = group_without(&index, new_parent.as_ref(), &tops);
    let at = insertion_index(&group, target, position);
    group.splice(at..at, tops.iter().cloned());

    let mut plan = PlanBuilder::new(snapshot);
    close_gaps(&mut plan, &index, &tops);
    plan.set_group(new_parent.as_ref(), &group);

    let target_label = target.map_or_else(|| "end".to_string(), |t| format!("{} {}", position, t));
    Ok(MovePlan {
        changes: plan.finish(),
        label: format!("move {} {}", describe(&tops), target_label),
    })
}

/// Moves `dragged` (with their descendants) to (`target`, `position`)
pub fn drag_drop(
    snapshot: &Snapshot,
    dragged: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
) -> Result<Applied, OutlineError> {
    let plan = plan_drag_drop(snapshot, dragged, target, position)
        .inspect_err(|e| debug!(items = dragged.len(), reason = %e, "drop refused"))?;
    debug!(changes = plan.changes.len(), "drop");
    Ok(plan.apply(snapshot))
}

// Promote / demote

pub fn check_promote(snapshot: &Snapshot, id: &ItemId) -> Result<(), OutlineError> {
    plan_promote(snapshot, id).map(|_| ())
}

pub fn plan_promote(snapshot: &Snapshot, id: &ItemId) -> Result<MovePlan, OutlineError> {
    let item = snapshot.require(id)?;
    let index = DescendantIndex::for_snapshot(snapshot);

    let parent = index.parent_of(id).cloned();
    let parent_type = parent.as_ref().and_then(|p| snapshot.get(p)).map(|p| p.item_type);
    let grandparent = parent.as_ref().and_then(|p| index.parent_of(p)).cloned();

    // A sub-task outdents one level and stays a task
    let new_type = match (item.item_type, parent_type) {
        (ItemType::Task, Some(ItemType::Task)) => ItemType::Task,
        (item_type, _) => hierarchy::promotion_target(item_type)
            .ok_or(BoundaryViolation::CannotPromote { item_type })?,
    };
    let new_parent = if parent.is_some() { grandparent } else { None };
    let new_parent_type = new_parent
        .as_ref()
        .and_then(|p| snapshot.get(p))
        .map(|p| p.item_type);

    hierarchy::validate_placement(new_type, new_parent_type).map_err(|e| e.for_item(id))?;
    let child_types = index
        .children_of(Some(id))
        .iter()
        .filter_map(|c| snapshot.get(c))
        .map(|c| c.item_type);
    hierarchy::validate_children(new_type, child_types).map_err(|e| e.for_item(id))?;

    let moved = [id.clone()];
    let mut group = group_without(&index, new_parent.as_ref(), &moved);
    let at = match &parent {
        Some(parent) => insertion_index(&group, Some(parent), DropPosition::After),
        None => index.sibling_rank(id).unwrap_or(group.len()),
    };
    group.insert(at.min(group.len()), id.clone());

    let mut plan = PlanBuilder::new(snapshot);
    close_gaps(&mut plan, &index, &moved);
    plan.set_group(new_parent.as_ref(), &group);
    plan.set_type(id, new_type);

    Ok(MovePlan {
        changes: plan.finish(),
        label: format!("promote {}", id),
    })
}

/// Moves an item one level up the hierarchy, placing it right after its
/// former parent
pub fn promote(snapshot: &Snapshot, id: &ItemId) -> Result<Applied, OutlineError> {
    let plan = plan_promote(snapshot, id)
        .inspect_err(|e| debug!(item = %id, reason = %e, "promote refused"))?;
    debug!(item = %id, changes = plan.changes.len(), "promote");
    Ok(plan.apply(snapshot))
}

pub fn check_demote(snapshot: &Snapshot, id: &ItemId) -> Result<(), OutlineError> {
    plan_demote(snapshot, id).map(|_| ())
}

pub fn plan_demote(snapshot: &Snapshot, id: &ItemId) -> Result<MovePlan, OutlineError> {
    snapshot.require(id)?;
    let index = DescendantIndex::for_snapshot(snapshot);

    let parent = index.parent_of(id).cloned();
    let siblings = index.children_of(parent.as_ref());
    let rank = index.sibling_rank(id).unwrap_or(0);
    let previous = match rank.checked_sub(1).and_then(|r| siblings.get(r)) {
        Some(previous) => previous.clone(),
        None => return Err(BoundaryViolation::NoPreviousSibling { id: id.clone() }.into()),
    };
    let previous_type = snapshot.require(&previous)?.item_type;

    let new_type = *hierarchy::allowed_child_types(Some(previous_type))
        .first()
        .ok_or(BoundaryViolation::NoNestingType {
            parent: previous_type,
        })?;
    let child_types = index
        .children_of(Some(id))
        .iter()
        .filter_map(|c| snapshot.get(c))
        .map(|c| c.item_type);
    hierarchy::validate_children(new_type, child_types).map_err(|e| e.for_item(id))?;

    let moved = [id.clone()];
    let mut group = group_without(&index, Some(&previous), &moved);
    group.push(id.clone());

    let mut plan = PlanBuilder::new(snapshot);
    close_gaps(&mut plan, &index, &moved);
    plan.set_group(Some(&previous), &group);
    plan.set_type(id, new_type);

    Ok(MovePlan {
        changes: plan.finish(),
        label: format!("demote {} under {}", id, previous),
    })
}

/// Nests an item under its preceding sibling as the last child
pub fn demote(snapshot: &Snapshot, id: &ItemId) -> Result<Applied, OutlineError> {
    let plan = plan_demote(snapshot, id)
        .inspect_err(|e| debug!(item = %id, reason = %e, "demote refused"))?;
    debug!(item = %id, changes = plan.changes.len(), "demote");
    Ok(plan.apply(snapshot))
}

// Keyboard move

/// Direction of a keyboard move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub fn check_move(snapshot: &Snapshot, id: &ItemId, direction: Direction) -> Result<(), OutlineError> {
    plan_move(snapshot, id, direction).map(|_| ())
}

/// Swaps an item's sort order with its adjacent sibling. Parent and type never
/// change, so the hierarchy table is not consulted.
///
/// Only the pair is touched. The group is renumbered `1..=n` only when the
/// two orders cannot be swapped cleanly: they are equal, or another sibling
/// shares one of them.
pub fn plan_move(snapshot: &Snapshot, id: &ItemId, direction: Direction) -> Result<MovePlan, OutlineError> {
    let item = snapshot.require(id)?;
    let index = DescendantIndex::for_snapshot(snapshot);
    let parent = index.parent_of(id).cloned();
    let mut group = index.children_of(parent.as_ref()).to_vec();
    let rank = index.sibling_rank(id).unwrap_or(0);

    let other = match direction {
        Direction::Up if rank == 0 => {
            return Err(BoundaryViolation::AtTop { id: id.clone() }.into())
        }
        Direction::Up => rank - 1,
        Direction::Down if rank + 1 >= group.len() => {
            return Err(BoundaryViolation::AtBottom { id: id.clone() }.into())
        }
        Direction::Down => rank + 1,
    };
    let neighbour = group[other].clone();
    let mine = item.sort_order;
    let theirs = snapshot.require(&neighbour)?.sort_order;
    let shared = group
        .iter()
        .filter(|s| **s != *id && **s != neighbour)
        .filter_map(|s| snapshot.get(s))
        .any(|s| s.sort_order == mine || s.sort_order == theirs);

    let mut plan = PlanBuilder::new(snapshot);
    if mine != theirs && !shared {
        plan.set_order(id, theirs);
        plan.set_order(&neighbour, mine);
    } else {
        group.swap(rank, other);
        plan.set_group(parent.as_ref(), &group);
    }

    let verb = match direction {
        Direction::Up => "up",
        Direction::Down => "down",
    };
    Ok(MovePlan {
        changes: plan.finish(),
        label: format!("move {} {}", id, verb),
    })
}

pub fn move_up(snapshot: &Snapshot, id: &ItemId) -> Result<Applied, OutlineError> {
    apply_move(snapshot, id, Direction::Up)
}

pub fn move_down(snapshot: &Snapshot, id: &ItemId) -> Result<Applied, OutlineError> {
    apply_move(snapshot, id, Direction::Down)
}

fn apply_move(snapshot: &Snapshot, id: &ItemId, direction: Direction) -> Result<Applied, OutlineError> {
    let plan = plan_move(snapshot, id, direction)
        .inspect_err(|e| debug!(item = %id, reason = %e, "move refused"))?;
    debug!(item = %id, ?direction, "move");
    Ok(plan.apply(snapshot))
}
