//! Tree builder and ASCII rendering
//!
//! Converts the flat item list into parent -> children trees (sibling order by
//! `sort_order`) and back.

use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::index::DescendantIndex;
use super::item::{Item, ItemType};
use super::snapshot::Snapshot;

/// An item with its nested children
///
/// The item fields are flattened into JSON, with an additional `children` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Builds the forest for the whole snapshot
pub fn build_tree(items: &[Item]) -> Vec<TreeNode> {
    let index = DescendantIndex::build(items);
    let snapshot = Snapshot::from_items(items.to_vec());
    index
        .roots()
        .iter()
        .filter_map(|id| build_subtree(id, &snapshot, &index))
        .collect()
}

/// Builds the subtree rooted at `id`; `None` if the id is absent
pub fn build_subtree(id: &ItemId, snapshot: &Snapshot, index: &DescendantIndex) -> Option<TreeNode> {
    build_node(id, snapshot, index, 0)
}

fn build_node(
    id: &ItemId,
    snapshot: &Snapshot,
    index: &DescendantIndex,
    depth: usize,
) -> Option<TreeNode> {
    // Depth beyond the item count means a parent cycle
    if depth > snapshot.len() {
        return None;
    }
    let item = snapshot.get(id)?.clone();
    let children = index
        .children_of(Some(id))
        .iter()
        .filter_map(|child| build_node(child, snapshot, index, depth + 1))
        .collect();
    Some(TreeNode { item, children })
}

/// Flattens a forest back into a list, parents before children (pre-order)
pub fn flatten(nodes: &[TreeNode]) -> Vec<Item> {
    let mut out = Vec::new();
    let mut stack: Vec<&TreeNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node.item.clone());
        stack.extend(node.children.iter().rev());
    }
    out
}

fn type_symbol(item_type: ItemType) -> char {
    match item_type {
        ItemType::Milestone => '◆',
        ItemType::Deliverable => '■',
        ItemType::Task => '•',
    }
}

/// Renders the forest as an ASCII tree with WBS numbers
///
/// ```text
/// ◆ 1 Plan
/// └── ■ 1.1 Design
///     ├── • 1.1.1 Sketch
///     └── • 1.1.2 Review
/// ◆ 2 Ship
/// ```
pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        render_node(&mut output, node, "", true, true);
    }
    output
}

fn render_node(output: &mut String, node: &TreeNode, prefix: &str, is_last: bool, is_root: bool) {
    if !is_root {
        output.push_str(prefix);
        output.push_str(if is_last { "└── " } else { "├── " });
    }
    output.push(type_symbol(node.item.item_type));
    output.push(' ');
    if !node.item.wbs_number.is_empty() {
        output.push_str(&node.item.wbs_number);
        output.push(' ');
    }
    output.push_str(&node.item.title);
    if node.item.collapsed && !node.children.is_empty() {
        output.push_str(&format!(" (+{})", node.size() - 1));
    }
    output.push('\n');

    if node.item.collapsed {
        return;
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };
    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
