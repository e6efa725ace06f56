//! Parent/child adjacency for a snapshot
//!
//! Built once per operation so bulk queries (multi-select drag, cut/paste)
//! stay near-linear instead of rescanning the flat list for every item.
//! Sibling lists are ordered by `sort_order`, ties broken by position in the
//! flat list. Items whose parent is absent from the snapshot are indexed as
//! roots.

use std::collections::{HashMap, HashSet};

use super::error::OutlineError;
use super::id::ItemId;
use super::item::Item;
use super::snapshot::Snapshot;

#[derive(Debug, Default)]
pub struct DescendantIndex {
    children: HashMap<Option<ItemId>, Vec<ItemId>>,
    parents: HashMap<ItemId, Option<ItemId>>,
}

impl DescendantIndex {
    pub fn build(items: &[Item]) -> Self {
        let known: HashSet<&ItemId> = items.iter().map(|i| &i.id).collect();

        let mut groups: HashMap<Option<ItemId>, Vec<(i64, usize)>> = HashMap::new();
        let mut parents = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            let parent = item.parent_id.clone().filter(|p| known.contains(p));
            parents.insert(item.id.clone(), parent.clone());
            groups.entry(parent).or_default().push((item.sort_order, pos));
        }

        let children = groups
            .into_iter()
            .map(|(parent, mut members)| {
                // Stable: equal sort orders keep flat-list order
                members.sort_by_key(|&(order, _)| order);
                let ids = members
                    .into_iter()
                    .map(|(_, pos)| items[pos].id.clone())
                    .collect();
                (parent, ids)
            })
            .collect();

        Self { children, parents }
    }

    pub fn for_snapshot(snapshot: &Snapshot) -> Self {
        Self::build(snapshot.items())
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.parents.contains_key(id)
    }

    /// Root items in sibling order
    pub fn roots(&self) -> &[ItemId] {
        self.children_of(None)
    }

    /// Direct children of `parent` (`None` for the root) in sibling order
    pub fn children_of(&self, parent: Option<&ItemId>) -> &[ItemId] {
        self.children
            .get(&parent.cloned())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolved parent of `id`; `None` for roots and unknown ids
    pub fn parent_of(&self, id: &ItemId) -> Option<&ItemId> {
        self.parents.get(id).and_then(Option::as_ref)
    }

    /// Zero-based rank of `id` among its siblings
    pub fn sibling_rank(&self, id: &ItemId) -> Option<usize> {
        let parent = self.parents.get(id)?;
        self.children_of(parent.as_ref()).iter().position(|s| s == id)
    }

    /// All ids transitively owned by `id`, in pre-order, excluding `id`
    pub fn descendants_of(&self, id: &ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(id.clone());

        let mut stack: Vec<&ItemId> = self.children_of(Some(id)).iter().rev().collect();
        while let Some(next) = stack.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            out.push(next.clone());
            stack.extend(self.children_of(Some(next)).iter().rev());
        }
        out
    }

    /// True if `ancestor` appears on the parent chain of `descendant`
    pub fn is_ancestor_of(&self, ancestor: &ItemId, descendant: &ItemId) -> bool {
        let mut current = self.parent_of(descendant);
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.parents.len() {
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Every reachable id in outline (pre-order) order
    pub fn outline_order(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.parents.len());
        for root in self.roots() {
            out.push(root.clone());
            out.extend(self.descendants_of(root));
        }
        out
    }

    /// Reduces a selection to its top-level members (those with no selected
    /// ancestor), in outline order
    ///
    /// Any selected ancestor counts, not just the direct parent, so a
    /// grandchild selected together with its grandparent is not top-level.
    pub fn top_level(&self, selection: &[ItemId]) -> Vec<ItemId> {
        let selected: HashSet<&ItemId> = selection.iter().collect();
        let mut tops: Vec<ItemId> = selection
            .iter()
            .filter(|id| {
                let mut current = self.parent_of(id);
                let mut steps = 0;
                while let Some(parent) = current {
                    if selected.contains(parent) {
                        return false;
                    }
                    steps += 1;
                    if steps > self.parents.len() {
                        break;
                    }
                    current = self.parent_of(parent);
                }
                true
            })
            .cloned()
            .collect();

        let rank: HashMap<ItemId, usize> = self
            .outline_order()
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        tops.sort_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));
        tops.dedup();
        tops
    }
}

/// All ids transitively owned by `id`, in pre-order
pub fn descendants_of(id: &ItemId, snapshot: &Snapshot) -> Result<Vec<ItemId>, OutlineError> {
    snapshot.require(id)?;
    Ok(DescendantIndex::for_snapshot(snapshot).descendants_of(id))
}

/// True if `candidate_ancestor` owns `candidate_descendant`, directly or not
pub fn is_ancestor_of(
    candidate_ancestor: &ItemId,
    candidate_descendant: &ItemId,
    snapshot: &Snapshot,
) -> bool {
    DescendantIndex::for_snapshot(snapshot).is_ancestor_of(candidate_ancestor, candidate_descendant)
}
