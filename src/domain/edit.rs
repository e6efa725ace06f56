//! Item create, update and delete
//!
//! Creation validates the new item's type against its parent and makes room
//! in the sibling group; deletion takes every descendant along and closes the
//! gap it leaves. Predecessor links pointing at deleted items are left alone;
//! the owning application decides what a dangling dependency means.

use std::collections::HashSet;
use tracing::debug;

use super::error::OutlineError;
use super::hierarchy;
use super::history::{Action, Applied, HistoryEntry};
use super::id::{IdGenerator, ItemId};
use super::index::DescendantIndex;
use super::item::{Item, NewItem, UpdateItem};
use super::placement::{self, DropPosition};
use super::reposition::{close_gaps, insertion_index, PlanBuilder};
use super::snapshot::Snapshot;

/// Creates a new item at (`target`, `position`)
///
/// With no target the item is appended at the root, which only a milestone
/// may occupy.
pub fn insert_item(
    snapshot: &Snapshot,
    new: NewItem,
    target: Option<&ItemId>,
    position: DropPosition,
    ids: &mut impl IdGenerator,
) -> Result<Applied, OutlineError> {
    let parent = placement::resolve_parent(target, position, snapshot)?;
    let parent_type = parent.as_ref().and_then(|p| snapshot.get(p)).map(|p| p.item_type);
    hierarchy::validate_placement(new.item_type, parent_type)
        .inspect_err(|e| debug!(reason = %e, "insert refused"))?;

    let id = ids.next_id(&new.title);
    let index = DescendantIndex::for_snapshot(snapshot);
    let mut group = index.children_of(parent.as_ref()).to_vec();
    let at = insertion_index(&group, target, position);
    group.insert(at, id.clone());

    let mut plan = PlanBuilder::new(snapshot);
    plan.set_group(parent.as_ref(), &group);
    let reordered = plan.finish();

    let mut item = Item::new(id.clone(), new.item_type, new.title).with_order(at as i64 + 1);
    item.parent_id = parent;
    item.container_id = new.container_id;

    let mut next = snapshot.clone();
    for change in &reordered {
        next.update(&change.id, |i| i.set_position(&change.after));
    }
    next.upsert(item.clone());
    let next = next.renumbered();

    debug!(item = %id, "insert");
    let label = format!("add {} {}", item.item_type, id);
    Ok(Applied {
        snapshot: next,
        entry: HistoryEntry::new(
            Action::Create {
                items: vec![item],
                reordered,
            },
            label,
        ),
    })
}

/// Applies field edits to one item; structure is never touched
pub fn update_item(
    snapshot: &Snapshot,
    id: &ItemId,
    update: &UpdateItem,
) -> Result<Applied, OutlineError> {
    let before = snapshot.require(id)?.clone();
    let mut after = before.clone();
    update.apply_to(&mut after);

    let mut next = snapshot.clone();
    next.upsert(after.clone());
    Ok(Applied {
        snapshot: next,
        entry: HistoryEntry::new(
            Action::Update {
                before: vec![before],
                after: vec![after],
            },
            format!("edit {}", id),
        ),
    })
}

/// Removes the selection together with all descendants
pub fn remove_items(snapshot: &Snapshot, selection: &[ItemId]) -> Result<Applied, OutlineError> {
    for id in selection {
        snapshot.require(id)?;
    }
    let index = DescendantIndex::for_snapshot(snapshot);
    let tops = index.top_level(selection);

    let mut doomed: HashSet<ItemId> = HashSet::new();
    for top in &tops {
        doomed.insert(top.clone());
        doomed.extend(index.descendants_of(top));
    }

    let mut plan = PlanBuilder::new(snapshot);
    close_gaps(&mut plan, &index, &tops);
    let reordered = plan.finish();

    let mut next = snapshot.clone();
    let removed = next.remove_all(&doomed);
    for change in &reordered {
        next.update(&change.id, |i| i.set_position(&change.after));
    }

    debug!(items = removed.len(), "remove");
    let label = match tops.as_slice() {
        [one] => format!("delete {}", one),
        many => format!("delete {} items", many.len()),
    };
    Ok(Applied {
        snapshot: next.renumbered(),
        entry: HistoryEntry::new(
            Action::Delete {
                items: removed,
                reordered,
            },
            label,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::HierarchyViolation;
    use crate::domain::id::SequentialIds;
    use crate::domain::item::{ItemStatus, ItemType};
    use crate::domain::test_support::{id, ids, sample};

    #[test]
    fn insert_appends_as_last_child() {
        let before = sample().renumbered();
        let mut gen = SequentialIds::new("n");
        let applied = insert_item(
            &before,
            NewItem::new(ItemType::Task, "Test"),
            Some(&id("D1")),
            DropPosition::Inside,
            &mut gen,
        )
        .unwrap();

        let created = applied.snapshot.get(&id("n1")).unwrap();
        assert_eq!(created.parent_id, Some(id("D1")));
        assert_eq!(created.wbs_number, "1.1.3");
        assert!(applied.snapshot.check_invariants().is_ok());
        assert_eq!(applied.entry.revert(&applied.snapshot).unwrap(), before);
    }

    #[test]
    fn insert_before_shifts_siblings() {
        let before = sample().renumbered();
        let mut gen = SequentialIds::new("n");
        let applied = insert_item(
            &before,
            NewItem::new(ItemType::Milestone, "Kickoff"),
            Some(&id("M1")),
            DropPosition::Before,
            &mut gen,
        )
        .unwrap();

        let s = &applied.snapshot;
        assert_eq!(s.get(&id("n1")).unwrap().wbs_number, "1");
        assert_eq!(s.get(&id("M1")).unwrap().wbs_number, "2");
        assert_eq!(s.get(&id("T2")).unwrap().wbs_number, "2.1.2");

        let undone = applied.entry.revert(s).unwrap();
        assert_eq!(undone, before);
        assert_eq!(applied.entry.reapply(&undone).unwrap(), *s);
    }

    #[test]
    fn insert_rejects_illegal_parent() {
        let mut gen = SequentialIds::new("n");
        let err = insert_item(
            &sample(),
            NewItem::new(ItemType::Deliverable, "Loose"),
            None,
            DropPosition::Inside,
            &mut gen,
        )
        .unwrap_err();
        assert_eq!(
            err,
            OutlineError::Hierarchy {
                item: None,
                reason: HierarchyViolation::RootNotAllowed {
                    child: ItemType::Deliverable
                },
            }
        );
    }

    #[test]
    fn update_changes_fields_only() {
        let before = sample().renumbered();
        let update = UpdateItem {
            title: Some("Sketch v2".into()),
            status: Some(ItemStatus::InProgress),
            progress: Some(250),
            ..Default::default()
        };
        let applied = update_item(&before, &id("T1"), &update).unwrap();
        let t1 = applied.snapshot.get(&id("T1")).unwrap();
        assert_eq!(t1.title, "Sketch v2");
        assert_eq!(t1.progress, 100);
        assert_eq!(t1.wbs_number, "1.1.1");
        assert!(!applied.entry.is_noop());

        let undone = applied.entry.revert(&applied.snapshot).unwrap();
        assert_eq!(undone, before);
    }

    #[test]
    fn empty_update_is_noop() {
        let applied = update_item(&sample(), &id("T1"), &UpdateItem::default()).unwrap();
        assert!(applied.entry.is_noop());
    }

    #[test]
    fn remove_takes_descendants_and_closes_gap() {
        let before = sample().renumbered();
        let applied = remove_items(&before, &ids(&["M1"])).unwrap();
        let s = &applied.snapshot;
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&id("M2")).unwrap().wbs_number, "1");
        assert_eq!(s.get(&id("M2")).unwrap().sort_order, 1);

        let undone = applied.entry.revert(s).unwrap();
        assert_eq!(undone, before);
    }

    #[test]
    fn remove_overlapping_selection() {
        let before = sample().renumbered();
        let applied = remove_items(&before, &ids(&["T1", "D1"])).unwrap();
        assert_eq!(applied.snapshot.len(), 2);
        assert_eq!(applied.entry.label, "delete D1");
        assert_eq!(
            remove_items(&before, &ids(&["ghost"])).unwrap_err(),
            OutlineError::NotFound(id("ghost"))
        );
    }
}
