//! Predecessor dependency graph
//!
//! Predecessor links are opaque to the outline structure, but linking must
//! not create a dependency cycle. Uses petgraph for cycle checks and
//! topological ordering.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::debug;

use super::error::{CycleViolation, OutlineError};
use super::history::{Action, Applied, HistoryEntry};
use super::id::ItemId;
use super::item::{Item, Predecessor};
use super::snapshot::Snapshot;

/// Edges run predecessor -> item ("predecessor comes first")
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ItemId, ()>,
    node_map: HashMap<ItemId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from every item's predecessor list
    ///
    /// Links to items outside `items` are skipped; they belong to other
    /// containers and cannot take part in a local cycle.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Self {
        let mut graph = Self::new();
        let items: Vec<_> = items.into_iter().collect();
        for item in &items {
            graph.add_item(item.id.clone());
        }
        for item in &items {
            for link in &item.predecessors {
                if let (Some(&from), Some(&to)) =
                    (graph.node_map.get(&link.item), graph.node_map.get(&item.id))
                {
                    graph.graph.update_edge(from, to, ());
                }
            }
        }
        graph
    }

    pub fn add_item(&mut self, id: ItemId) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
        }
    }

    fn node(&self, id: &ItemId) -> Result<NodeIndex, OutlineError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| OutlineError::NotFound(id.clone()))
    }

    /// Checks that `item` may list `predecessor` without closing a cycle
    pub fn check_link(&self, item: &ItemId, predecessor: &ItemId) -> Result<(), OutlineError> {
        if item == predecessor {
            return Err(CycleViolation::SelfDependency { id: item.clone() }.into());
        }
        let item_idx = self.node(item)?;
        let pred_idx = self.node(predecessor)?;

        // predecessor -> item closes a cycle iff item already reaches predecessor
        if has_path_connecting(&self.graph, item_idx, pred_idx, None) {
            return Err(CycleViolation::Dependency {
                item: item.clone(),
                predecessor: predecessor.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Adds the edge `predecessor -> item` after checking for cycles
    pub fn add_link(&mut self, item: &ItemId, predecessor: &ItemId) -> Result<(), OutlineError> {
        self.check_link(item, predecessor)?;
        let item_idx = self.node(item)?;
        let pred_idx = self.node(predecessor)?;
        self.graph.update_edge(pred_idx, item_idx, ());
        Ok(())
    }

    pub fn remove_link(&mut self, item: &ItemId, predecessor: &ItemId) -> bool {
        let (Ok(item_idx), Ok(pred_idx)) = (self.node(item), self.node(predecessor)) else {
            return false;
        };
        match self.graph.find_edge(pred_idx, item_idx) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                true
            }
            None => false,
        }
    }

    fn neighbors(&self, id: &ItemId, direction: Direction) -> Vec<ItemId> {
        let Some(&idx) = self.node_map.get(id) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    /// Items that must come before `id`
    pub fn predecessors_of(&self, id: &ItemId) -> Vec<ItemId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Items that wait on `id`
    pub fn successors_of(&self, id: &ItemId) -> Vec<ItemId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// All items, predecessors before successors
    pub fn schedule_order(&self) -> Result<Vec<ItemId>, OutlineError> {
        toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect()
            })
            .map_err(|cycle| {
                let id = self.graph[cycle.node_id()].clone();
                CycleViolation::Dependency {
                    item: id.clone(),
                    predecessor: id,
                }
                .into()
            })
    }

    /// Incomplete items whose predecessors are all complete
    pub fn ready_items(&self, snapshot: &Snapshot) -> Vec<ItemId> {
        let is_complete = |id: &ItemId| snapshot.get(id).is_some_and(|i| i.status.is_complete());
        let mut ready: Vec<ItemId> = self
            .node_map
            .keys()
            .filter(|id| !is_complete(*id))
            .filter(|id| self.predecessors_of(*id).iter().all(|p| is_complete(p)))
            .cloned()
            .collect();
        ready.sort();
        ready
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

/// Adds `predecessor` to `item`'s predecessor list
///
/// Rejects self links and links that would create a dependency cycle. A
/// duplicate link yields a no-op entry.
pub fn link_predecessor(
    snapshot: &Snapshot,
    item: &ItemId,
    predecessor: Predecessor,
) -> Result<Applied, OutlineError> {
    let current = snapshot.require(item)?;
    snapshot.require(&predecessor.item)?;
    DependencyGraph::from_items(snapshot.iter())
        .check_link(item, &predecessor.item)
        .inspect_err(|e| debug!(item = %item, reason = %e, "link refused"))?;

    let before = current.clone();
    let mut after = before.clone();
    let label = format!("link {} after {}", item, predecessor.item);
    after.add_predecessor(predecessor);
    debug!(item = %item, "link");
    Ok(replace(snapshot, before, after, label))
}

/// Removes every link from `item` to `predecessor`
pub fn unlink_predecessor(
    snapshot: &Snapshot,
    item: &ItemId,
    predecessor: &ItemId,
) -> Result<Applied, OutlineError> {
    let before = snapshot.require(item)?.clone();
    let mut after = before.clone();
    after.remove_predecessor(predecessor);
    Ok(replace(snapshot, before, after, format!("unlink {} from {}", item, predecessor)))
}

fn replace(snapshot: &Snapshot, before: Item, after: Item, label: String) -> Applied {
    let mut next = snapshot.clone();
    next.upsert(after.clone());
    Applied {
        snapshot: next,
        entry: HistoryEntry::new(
            Action::Update {
                before: vec![before],
                after: vec![after],
            },
            label,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemStatus, PredecessorKind};
    use crate::domain::test_support::{id, sample};

    fn linked(snapshot: &Snapshot, item: &str, pred: &str) -> Snapshot {
        link_predecessor(snapshot, &id(item), Predecessor::finish_to_start(id(pred)))
            .unwrap()
            .snapshot
    }

    #[test]
    fn builds_edges_from_predecessors() {
        let snapshot = linked(&sample(), "T2", "T1");
        let graph = DependencyGraph::from_items(snapshot.iter());
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.predecessors_of(&id("T2")), vec![id("T1")]);
        assert_eq!(graph.successors_of(&id("T1")), vec![id("T2")]);
        assert!(graph.predecessors_of(&id("ghost")).is_empty());
    }

    #[test]
    fn link_adds_predecessor_and_is_undoable() {
        let before = sample();
        let applied = link_predecessor(
            &before,
            &id("M2"),
            Predecessor {
                item: id("M1"),
                kind: PredecessorKind::StartToStart,
                lag: 2,
            },
        )
        .unwrap();
        let m2 = applied.snapshot.get(&id("M2")).unwrap();
        assert_eq!(m2.predecessors.len(), 1);
        assert_eq!(m2.predecessors[0].kind, PredecessorKind::StartToStart);

        let reverted = applied.entry.revert(&applied.snapshot).unwrap();
        assert!(reverted.get(&id("M2")).unwrap().predecessors.is_empty());
    }

    #[test]
    fn self_link_is_rejected() {
        let err = link_predecessor(&sample(), &id("T1"), Predecessor::finish_to_start(id("T1")))
            .unwrap_err();
        assert_eq!(err, CycleViolation::SelfDependency { id: id("T1") }.into());
    }

    #[test]
    fn cyclic_link_is_rejected() {
        let s = linked(&sample(), "T2", "T1");
        let s = linked(&s, "M2", "T2");
        let err = link_predecessor(&s, &id("T1"), Predecessor::finish_to_start(id("M2"))).unwrap_err();
        assert_eq!(
            err,
            CycleViolation::Dependency {
                item: id("T1"),
                predecessor: id("M2")
            }
            .into()
        );
    }

    #[test]
    fn duplicate_link_is_noop() {
        let s = linked(&sample(), "T2", "T1");
        let applied = link_predecessor(&s, &id("T2"), Predecessor::finish_to_start(id("T1"))).unwrap();
        assert!(applied.entry.is_noop());
        assert_eq!(applied.snapshot.get(&id("T2")).unwrap().predecessors.len(), 1);
    }

    #[test]
    fn unlink_removes_link() {
        let s = linked(&sample(), "T2", "T1");
        let applied = unlink_predecessor(&s, &id("T2"), &id("T1")).unwrap();
        assert!(applied.snapshot.get(&id("T2")).unwrap().predecessors.is_empty());

        let mut graph = DependencyGraph::from_items(s.iter());
        assert!(graph.remove_link(&id("T2"), &id("T1")));
        assert!(!graph.remove_link(&id("T2"), &id("T1")));
    }

    #[test]
    fn schedule_order_puts_predecessors_first() {
        let s = linked(&sample(), "T1", "T2");
        let s = linked(&s, "T2", "M2");
        let order = DependencyGraph::from_items(s.iter()).schedule_order().unwrap();
        let pos = |x: &str| order.iter().position(|i| i == &id(x)).unwrap();
        assert!(pos("M2") < pos("T2"));
        assert!(pos("T2") < pos("T1"));
    }

    #[test]
    fn ready_items_wait_on_incomplete_predecessors() {
        let mut s = linked(&sample(), "T2", "T1");
        let graph = DependencyGraph::from_items(s.iter());
        let ready = graph.ready_items(&s);
        assert!(ready.contains(&id("T1")));
        assert!(!ready.contains(&id("T2")));

        s.update(&id("T1"), |t| t.status = ItemStatus::Done);
        let ready = graph.ready_items(&s);
        assert!(!ready.contains(&id("T1")));
        assert!(ready.contains(&id("T2")));
    }

    #[test]
    fn add_link_checks_nodes() {
        let mut graph = DependencyGraph::new();
        graph.add_item(id("A"));
        assert_eq!(
            graph.add_link(&id("A"), &id("B")),
            Err(OutlineError::NotFound(id("B")))
        );
        graph.add_item(id("B"));
        assert!(graph.add_link(&id("A"), &id("B")).is_ok());
        assert!(graph.contains(&id("B")));
        assert!(graph.add_link(&id("B"), &id("A")).is_err());
    }
}
