//! Placement validation for drag-drop, paste and insert
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. a drop with no target goes to the end of the root list
//! 2. the target must not be one of the dragged items
//! 3. the target must not be a descendant of any dragged item
//! 4. every top-level dragged item must be a legal child of the new parent
//!
//! A heterogeneous selection is all-or-nothing: one failing member rejects
//! the whole drop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{CycleViolation, OutlineError};
use super::hierarchy;
use super::id::ItemId;
use super::index::DescendantIndex;
use super::item::ItemType;
use super::snapshot::Snapshot;

/// Where a drop lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Before,
    After,
    #[default]
    Inside,
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
            DropPosition::Inside => "inside",
        })
    }
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(DropPosition::Before),
            "after" => Ok(DropPosition::After),
            "inside" | "into" => Ok(DropPosition::Inside),
            other => Err(format!("unknown drop position '{}'", other)),
        }
    }
}

/// Resolves the parent a drop at (`target`, `position`) would produce
pub fn resolve_parent(
    target: Option<&ItemId>,
    position: DropPosition,
    snapshot: &Snapshot,
) -> Result<Option<ItemId>, OutlineError> {
    let Some(target) = target else {
        return Ok(None);
    };
    let target_item = snapshot.require(target)?;
    Ok(match position {
        DropPosition::Inside => Some(target.clone()),
        DropPosition::Before | DropPosition::After => target_item
            .parent_id
            .clone()
            .filter(|p| snapshot.contains(p)),
    })
}

/// Checks each `(item, type)` against the parent type; the first illegal one
/// is reported
pub fn validate_types<'a, I>(members: I, parent_type: Option<ItemType>) -> Result<(), OutlineError>
where
    I: IntoIterator<Item = (&'a ItemId, ItemType)>,
{
    for (id, item_type) in members {
        hierarchy::validate_placement(item_type, parent_type).map_err(|e| e.for_item(id))?;
    }
    Ok(())
}

/// Decides whether `dragged` may be dropped at (`target`, `position`)
pub fn validate_placement(
    dragged: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
    snapshot: &Snapshot,
) -> Result<(), OutlineError> {
    let index = DescendantIndex::for_snapshot(snapshot);
    check(dragged, target, position, snapshot, &index).map(|_| ())
}

/// Runs the validation and returns the resolved new parent
pub(crate) fn check(
    dragged: &[ItemId],
    target: Option<&ItemId>,
    position: DropPosition,
    snapshot: &Snapshot,
    index: &DescendantIndex,
) -> Result<Option<ItemId>, OutlineError> {
    for id in dragged {
        snapshot.require(id)?;
    }
    if let Some(target) = target {
        snapshot.require(target)?;
        check_target(dragged, target, index)?;
    }

    let new_parent = resolve_parent(target, position, snapshot)?;
    let parent_type = new_parent
        .as_ref()
        .and_then(|p| snapshot.get(p))
        .map(|p| p.item_type);

    let tops = index.top_level(dragged);
    let members = tops
        .iter()
        .filter_map(|id| snapshot.get(id).map(|item| (id, item.item_type)));
    validate_types(members, parent_type)?;

    Ok(new_parent)
}

/// Rejects a target that is one of `moving` or lies inside one of them
pub(crate) fn check_target(
    moving: &[ItemId],
    target: &ItemId,
    index: &DescendantIndex,
) -> Result<(), OutlineError> {
    if moving.contains(target) {
        return Err(CycleViolation::SelfTarget { id: target.clone() }.into());
    }
    if let Some(moved) = moving.iter().find(|m| index.is_ancestor_of(m, target)) {
        return Err(CycleViolation::IntoDescendant {
            target: target.clone(),
            moved: moved.clone(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::HierarchyViolation;
    use crate::domain::test_support::{id, ids, sample};

    #[test]
    fn drop_without_target_goes_to_root() {
        let snapshot = sample();
        assert!(validate_placement(&ids(&["M2"]), None, DropPosition::Inside, &snapshot).is_ok());

        let err = validate_placement(&ids(&["D1"]), None, DropPosition::After, &snapshot).unwrap_err();
        assert_eq!(err.to_string(), "deliverable cannot be at root level");
    }

    #[test]
    fn self_drop_is_rejected() {
        let err = validate_placement(&ids(&["T1"]), Some(&id("T1")), DropPosition::After, &sample())
            .unwrap_err();
        assert_eq!(err, CycleViolation::SelfTarget { id: id("T1") }.into());
    }

    #[test]
    fn drop_into_own_descendant_is_rejected() {
        let err = validate_placement(&ids(&["D1"]), Some(&id("T1")), DropPosition::Inside, &sample())
            .unwrap_err();
        assert_eq!(
            err,
            CycleViolation::IntoDescendant {
                target: id("T1"),
                moved: id("D1")
            }
            .into()
        );
    }

    #[test]
    fn before_and_after_use_target_parent() {
        let snapshot = sample();
        // T2 before T1: same parent D1
        assert!(validate_placement(&ids(&["T2"]), Some(&id("T1")), DropPosition::Before, &snapshot).is_ok());
        // M2 after M1: root
        assert!(validate_placement(&ids(&["M2"]), Some(&id("M1")), DropPosition::After, &snapshot).is_ok());
        // T1 after M2: root, illegal for a task
        let err = validate_placement(&ids(&["T1"]), Some(&id("M2")), DropPosition::After, &snapshot)
            .unwrap_err();
        assert!(matches!(
            err,
            OutlineError::Hierarchy {
                reason: HierarchyViolation::RootNotAllowed { child: ItemType::Task },
                ..
            }
        ));
    }

    #[test]
    fn inside_uses_target_as_parent() {
        let snapshot = sample();
        assert!(validate_placement(&ids(&["D1"]), Some(&id("M2")), DropPosition::Inside, &snapshot).is_ok());
        assert!(validate_placement(&ids(&["T2"]), Some(&id("T1")), DropPosition::Inside, &snapshot).is_ok());

        let err = validate_placement(&ids(&["T1"]), Some(&id("M2")), DropPosition::Inside, &snapshot)
            .unwrap_err();
        assert_eq!(err.to_string(), "task cannot be placed under milestone");
    }

    #[test]
    fn children_move_implicitly() {
        // D1 with its tasks selected: only D1 is checked against M2
        let snapshot = sample();
        assert!(validate_placement(
            &ids(&["D1", "T1", "T2"]),
            Some(&id("M2")),
            DropPosition::Inside,
            &snapshot
        )
        .is_ok());
    }

    #[test]
    fn heterogeneous_selection_fails_as_a_whole() {
        let snapshot = sample();
        let err = validate_placement(&ids(&["M2", "T2"]), Some(&id("M1")), DropPosition::After, &snapshot)
            .unwrap_err();
        assert_eq!(
            err,
            OutlineError::Hierarchy {
                item: Some(id("T2")),
                reason: HierarchyViolation::RootNotAllowed { child: ItemType::Task },
            }
        );
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let snapshot = sample();
        assert_eq!(
            validate_placement(&ids(&["ghost"]), None, DropPosition::Inside, &snapshot),
            Err(OutlineError::NotFound(id("ghost")))
        );
        assert_eq!(
            validate_placement(&ids(&["T1"]), Some(&id("ghost")), DropPosition::Inside, &snapshot),
            Err(OutlineError::NotFound(id("ghost")))
        );
    }

    #[test]
    fn resolve_parent_for_each_position() {
        let snapshot = sample();
        assert_eq!(resolve_parent(None, DropPosition::Inside, &snapshot), Ok(None));
        assert_eq!(
            resolve_parent(Some(&id("T1")), DropPosition::Before, &snapshot),
            Ok(Some(id("D1")))
        );
        assert_eq!(
            resolve_parent(Some(&id("D1")), DropPosition::Inside, &snapshot),
            Ok(Some(id("D1")))
        );
        assert_eq!(resolve_parent(Some(&id("M1")), DropPosition::After, &snapshot), Ok(None));
    }

    #[test]
    fn validate_types_reports_item() {
        let t = id("X");
        let err = validate_types([(&t, ItemType::Deliverable)], Some(ItemType::Deliverable)).unwrap_err();
        assert_eq!(
            err,
            OutlineError::Hierarchy {
                item: Some(id("X")),
                reason: HierarchyViolation::ParentNotAllowed {
                    child: ItemType::Deliverable,
                    parent: ItemType::Deliverable
                },
            }
        );
    }

    #[test]
    fn drop_position_parses() {
        assert_eq!("Before".parse::<DropPosition>(), Ok(DropPosition::Before));
        assert_eq!("into".parse::<DropPosition>(), Ok(DropPosition::Inside));
        assert!("under".parse::<DropPosition>().is_err());
    }
}
