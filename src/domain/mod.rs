//! Outline engine
//!
//! Pure operations over an in-memory snapshot of outline items. Nothing in
//! this module performs I/O or keeps state between calls.

mod clipboard;
mod edit;
mod error;
mod graph;
mod hierarchy;
mod history;
mod id;
mod index;
mod item;
mod placement;
mod reposition;
mod snapshot;
mod tree;
mod wbs;

#[cfg(test)]
pub(crate) mod test_support;

pub use clipboard::{
    copy, paste, prepare_for_paste, remove_cut_sources, ClipboardMode, ClipboardPayload, PasteOptions,
    Pasted, PastedForest, DEFAULT_COPY_SUFFIX,
};
pub use edit::{insert_item, remove_items, update_item};
pub use error::{BoundaryViolation, CycleViolation, HierarchyViolation, MalformedSnapshot, OutlineError};
pub use graph::{link_predecessor, unlink_predecessor, DependencyGraph};
pub use hierarchy::{
    allowed_child_types, allowed_parent_types, demotion_target, promotion_target, validate_children,
};
pub use history::{
    Action, ActionKind, Applied, History, HistoryEntry, PositionChange, DEFAULT_HISTORY_LIMIT,
};
pub use id::{HashIds, IdError, IdGenerator, ItemId, SequentialIds};
pub use index::{descendants_of, is_ancestor_of, DescendantIndex};
pub use item::{
    Item, ItemStatus, ItemType, NewItem, Position, Predecessor, PredecessorKind, UpdateItem,
};
pub use placement::{resolve_parent, validate_placement, validate_types, DropPosition};
pub use reposition::{
    check_demote, check_drag_drop, check_move, check_promote, demote, drag_drop, move_down, move_up,
    plan_demote, plan_drag_drop, plan_move, plan_promote, promote, Direction, MovePlan,
};
pub use snapshot::Snapshot;
pub use tree::{build_subtree, build_tree, flatten, render_tree, TreeNode};
pub use wbs::{assign_wbs, compare as compare_wbs, wbs_numbers};
