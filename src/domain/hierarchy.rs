//! Type hierarchy rules
//!
//! Single source of truth for which item type may sit where:
//!
//! ```text
//! (root) -> milestone -> deliverable -> task -> task ...
//! ```
//!
//! Everything here is a pure function of the static table.

use super::error::{HierarchyViolation, OutlineError};
use super::item::ItemType;

/// Parent types an item of `child` may have; `None` means the root
pub fn allowed_parent_types(child: ItemType) -> &'static [Option<ItemType>] {
    match child {
        ItemType::Milestone => &[None],
        ItemType::Deliverable => &[Some(ItemType::Milestone)],
        ItemType::Task => &[Some(ItemType::Deliverable), Some(ItemType::Task)],
    }
}

/// Child types allowed under `parent` (`None` for the root), in preference order
pub fn allowed_child_types(parent: Option<ItemType>) -> &'static [ItemType] {
    match parent {
        None => &[ItemType::Milestone],
        Some(ItemType::Milestone) => &[ItemType::Deliverable],
        Some(ItemType::Deliverable) => &[ItemType::Task],
        Some(ItemType::Task) => &[ItemType::Task],
    }
}

/// Checks that `child` may be placed under `parent`
pub fn validate_placement(child: ItemType, parent: Option<ItemType>) -> Result<(), OutlineError> {
    if allowed_parent_types(child).contains(&parent) {
        return Ok(());
    }
    let reason = match parent {
        None => HierarchyViolation::RootNotAllowed { child },
        Some(parent) => HierarchyViolation::ParentNotAllowed { child, parent },
    };
    Err(OutlineError::hierarchy(reason))
}

/// Type an item becomes when promoted one level
pub fn promotion_target(item_type: ItemType) -> Option<ItemType> {
    match item_type {
        ItemType::Milestone => None,
        ItemType::Deliverable => Some(ItemType::Milestone),
        ItemType::Task => Some(ItemType::Deliverable),
    }
}

/// Type an item becomes when demoted one level. Tasks have no lower type but
/// can still nest under a sibling task.
pub fn demotion_target(item_type: ItemType) -> Option<ItemType> {
    match item_type {
        ItemType::Milestone => Some(ItemType::Deliverable),
        ItemType::Deliverable => Some(ItemType::Task),
        ItemType::Task => None,
    }
}

/// Checks that every existing child type stays legal under `new_type`
pub fn validate_children<I>(new_type: ItemType, child_types: I) -> Result<(), OutlineError>
where
    I: IntoIterator<Item = ItemType>,
{
    let allowed = allowed_child_types(Some(new_type));
    match child_types.into_iter().find(|t| !allowed.contains(t)) {
        Some(child_type) => Err(OutlineError::hierarchy(HierarchyViolation::WouldOrphan {
            child_type,
        })),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_and_child_tables_agree() {
        for child in ItemType::ALL {
            for parent in [
                None,
                Some(ItemType::Milestone),
                Some(ItemType::Deliverable),
                Some(ItemType::Task),
            ] {
                let by_parent = allowed_parent_types(child).contains(&parent);
                let by_child = allowed_child_types(parent).contains(&child);
                assert_eq!(by_parent, by_child, "{child} under {parent:?}");
            }
        }
    }

    #[test]
    fn only_milestones_at_root() {
        assert!(validate_placement(ItemType::Milestone, None).is_ok());

        let err = validate_placement(ItemType::Deliverable, None).unwrap_err();
        assert_eq!(err.to_string(), "deliverable cannot be at root level");
        assert!(matches!(
            err,
            OutlineError::Hierarchy {
                reason: HierarchyViolation::RootNotAllowed {
                    child: ItemType::Deliverable
                },
                ..
            }
        ));

        assert!(validate_placement(ItemType::Task, None).is_err());
    }

    #[test]
    fn tasks_nest_under_deliverables_and_tasks() {
        assert!(validate_placement(ItemType::Task, Some(ItemType::Deliverable)).is_ok());
        assert!(validate_placement(ItemType::Task, Some(ItemType::Task)).is_ok());

        let err = validate_placement(ItemType::Task, Some(ItemType::Milestone)).unwrap_err();
        assert_eq!(err.to_string(), "task cannot be placed under milestone");
    }

    #[test]
    fn nothing_goes_under_wrong_level() {
        assert!(validate_placement(ItemType::Milestone, Some(ItemType::Milestone)).is_err());
        assert!(validate_placement(ItemType::Deliverable, Some(ItemType::Deliverable)).is_err());
        assert!(validate_placement(ItemType::Deliverable, Some(ItemType::Task)).is_err());
    }

    #[test]
    fn promotion_and_demotion_targets() {
        assert_eq!(promotion_target(ItemType::Milestone), None);
        assert_eq!(promotion_target(ItemType::Deliverable), Some(ItemType::Milestone));
        assert_eq!(promotion_target(ItemType::Task), Some(ItemType::Deliverable));

        assert_eq!(demotion_target(ItemType::Milestone), Some(ItemType::Deliverable));
        assert_eq!(demotion_target(ItemType::Deliverable), Some(ItemType::Task));
        assert_eq!(demotion_target(ItemType::Task), None);
    }

    #[test]
    fn children_check_reports_first_illegal_type() {
        assert!(validate_children(ItemType::Deliverable, [ItemType::Task]).is_ok());
        assert!(validate_children(ItemType::Milestone, []).is_ok());

        let err = validate_children(ItemType::Milestone, [ItemType::Task]).unwrap_err();
        assert_eq!(err.to_string(), "would orphan task children");
    }
}
