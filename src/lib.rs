//! Outline - typed work-item trees with WBS numbering
//!
//! Items form a strict hierarchy (milestone, deliverable, task, sub-task).
//! The [`domain`] layer validates and applies structural edits as pure
//! functions over a snapshot, the [`storage`] layer keeps the snapshot in
//! git-friendly files, and the [`cli`] layer wires them into commands.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{Item, ItemId, ItemType, OutlineError, Snapshot};
