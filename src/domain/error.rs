//! Outcome types for refused operations
//!
//! Every domain operation returns `Result<_, OutlineError>`. User-facing
//! refusals (hierarchy, cycle, boundary) are separated from snapshot defects
//! (`Malformed`), which indicate a stale or corrupt snapshot rather than a
//! bad user gesture.

use thiserror::Error;

use super::id::ItemId;
use super::item::ItemType;

/// A placement that breaks the type table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HierarchyViolation {
    #[error("{child} cannot be at root level")]
    RootNotAllowed { child: ItemType },

    #[error("{child} cannot be placed under {parent}")]
    ParentNotAllowed { child: ItemType, parent: ItemType },

    #[error("would orphan {child_type} children")]
    WouldOrphan { child_type: ItemType },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleViolation {
    #[error("cannot drop {id} onto itself")]
    SelfTarget { id: ItemId },

    #[error("cannot move {moved} inside its own descendant {target}")]
    IntoDescendant { target: ItemId, moved: ItemId },

    #[error("{id} cannot depend on itself")]
    SelfDependency { id: ItemId },

    #[error("linking {item} after {predecessor} would create a dependency cycle")]
    Dependency { item: ItemId, predecessor: ItemId },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundaryViolation {
    #[error("already at top")]
    AtTop { id: ItemId },

    #[error("already at bottom")]
    AtBottom { id: ItemId },

    #[error("{item_type} cannot be promoted")]
    CannotPromote { item_type: ItemType },

    #[error("no previous item to nest under")]
    NoPreviousSibling { id: ItemId },

    #[error("cannot nest under {parent}")]
    NoNestingType { parent: ItemType },
}

/// Defects in the snapshot itself
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedSnapshot {
    #[error("duplicate item id {0}")]
    DuplicateId(ItemId),

    #[error("{item} references missing parent {parent}")]
    MissingParent { item: ItemId, parent: ItemId },

    #[error("{item} is its own ancestor")]
    ParentCycle { item: ItemId },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutlineError {
    #[error("{reason}")]
    Hierarchy {
        /// The offending item, when the check concerned an existing item
        item: Option<ItemId>,
        reason: HierarchyViolation,
    },

    #[error("{0}")]
    Cycle(CycleViolation),

    #[error("{0}")]
    Boundary(BoundaryViolation),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Malformed snapshot: {0}")]
    Malformed(MalformedSnapshot),
}

impl OutlineError {
    pub(crate) fn hierarchy(reason: HierarchyViolation) -> Self {
        OutlineError::Hierarchy { item: None, reason }
    }

    /// Attaches the offending item to a hierarchy violation
    pub(crate) fn for_item(self, id: &ItemId) -> Self {
        match self {
            OutlineError::Hierarchy { item: None, reason } => OutlineError::Hierarchy {
                item: Some(id.clone()),
                reason,
            },
            other => other,
        }
    }

    /// Returns true for snapshot defects, as opposed to refused user gestures
    pub fn is_defect(&self) -> bool {
        matches!(self, OutlineError::Malformed(_))
    }
}

impl From<CycleViolation> for OutlineError {
    fn from(v: CycleViolation) -> Self {
        OutlineError::Cycle(v)
    }
}

impl From<BoundaryViolation> for OutlineError {
    fn from(v: BoundaryViolation) -> Self {
        OutlineError::Boundary(v)
    }
}

impl From<MalformedSnapshot> for OutlineError {
    fn from(v: MalformedSnapshot) -> Self {
        OutlineError::Malformed(v)
    }
}
