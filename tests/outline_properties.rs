//! Property tests for the outline engine
//!
//! Random legal outlines are put through random structural operations. Every
//! accepted operation must leave a well-formed, correctly numbered outline and
//! must be exactly reversible through its history entry.

use std::collections::{BTreeMap, HashSet};

use outline::domain::{
    copy, demote, drag_drop, insert_item, move_down, move_up, paste, promote, remove_items,
    Applied, ClipboardMode, DescendantIndex, DropPosition, HashIds, History, HistoryEntry, ItemId,
    ItemType, NewItem, OutlineError, PasteOptions, SequentialIds, Snapshot, TreeNode,
};
use proptest::prelude::*;

fn add(snapshot: &mut Snapshot, item_type: ItemType, parent: Option<&ItemId>, ids: &mut SequentialIds) -> ItemId {
    let applied = insert_item(
        snapshot,
        NewItem::new(item_type, item_type.as_str()),
        parent,
        DropPosition::Inside,
        ids,
    )
    .unwrap();
    let id = applied.entry.action.item_ids().remove(0);
    *snapshot = applied.snapshot;
    id
}

/// milestones > deliverables > tasks > sub-task counts
fn build(shape: Vec<Vec<Vec<usize>>>) -> Snapshot {
    let mut ids = SequentialIds::new("n");
    let mut snapshot = Snapshot::new();
    for deliverables in shape {
        let m = add(&mut snapshot, ItemType::Milestone, None, &mut ids);
        for tasks in deliverables {
            let d = add(&mut snapshot, ItemType::Deliverable, Some(&m), &mut ids);
            for subtasks in tasks {
                let t = add(&mut snapshot, ItemType::Task, Some(&d), &mut ids);
                for _ in 0..subtasks {
                    add(&mut snapshot, ItemType::Task, Some(&t), &mut ids);
                }
            }
        }
    }
    snapshot
}

fn outline_strategy() -> impl Strategy<Value = Snapshot> {
    let tasks = proptest::collection::vec(0usize..3, 0..3);
    let deliverables = proptest::collection::vec(tasks, 0..3);
    proptest::collection::vec(deliverables, 1..4).prop_map(build)
}

#[derive(Debug, Clone)]
enum Op {
    Drop(usize, usize, DropPosition),
    Promote(usize),
    Demote(usize),
    Up(usize),
    Down(usize),
    Delete(usize),
    Paste(usize, usize, DropPosition),
}

fn position_strategy() -> impl Strategy<Value = DropPosition> {
    prop_oneof![
        Just(DropPosition::Before),
        Just(DropPosition::After),
        Just(DropPosition::Inside),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), any::<usize>(), position_strategy()).prop_map(|(a, b, p)| Op::Drop(a, b, p)),
        any::<usize>().prop_map(Op::Promote),
        any::<usize>().prop_map(Op::Demote),
        any::<usize>().prop_map(Op::Up),
        any::<usize>().prop_map(Op::Down),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), any::<usize>(), position_strategy()).prop_map(|(a, b, p)| Op::Paste(a, b, p)),
    ]
}

fn pick(snapshot: &Snapshot, n: usize) -> ItemId {
    let items = snapshot.items();
    items[n % items.len()].id.clone()
}

fn apply(snapshot: &Snapshot, op: &Op) -> Result<Applied, OutlineError> {
    match *op {
        Op::Drop(a, b, position) => {
            let target = pick(snapshot, b);
            drag_drop(snapshot, &[pick(snapshot, a)], Some(&target), position)
        }
        Op::Promote(a) => promote(snapshot, &pick(snapshot, a)),
        Op::Demote(a) => demote(snapshot, &pick(snapshot, a)),
        Op::Up(a) => move_up(snapshot, &pick(snapshot, a)),
        Op::Down(a) => move_down(snapshot, &pick(snapshot, a)),
        Op::Delete(a) => remove_items(snapshot, &[pick(snapshot, a)]),
        Op::Paste(a, b, position) => {
            let payload = copy(snapshot, &[pick(snapshot, a)], ClipboardMode::Copy)?;
            let target = pick(snapshot, b);
            let mut ids = HashIds::avoiding(snapshot.iter().map(|i| &i.id));
            paste(snapshot, &payload, Some(&target), position, &PasteOptions::default(), &mut ids)
                .map(|pasted| pasted.applied)
        }
    }
}

type Structure = BTreeMap<ItemId, (Option<ItemId>, ItemType, String)>;

fn structure(snapshot: &Snapshot) -> Structure {
    snapshot
        .iter()
        .map(|i| (i.id.clone(), (i.parent_id.clone(), i.item_type, i.wbs_number.clone())))
        .collect()
}

/// Each number is the parent's number plus the 1-based sibling rank
fn check_wbs(snapshot: &Snapshot) -> Result<(), TestCaseError> {
    let index = DescendantIndex::for_snapshot(snapshot);
    let mut stack: Vec<(Option<ItemId>, String)> = vec![(None, String::new())];
    while let Some((parent, prefix)) = stack.pop() {
        for (rank, child) in index.children_of(parent.as_ref()).iter().enumerate() {
            let expected = if prefix.is_empty() {
                (rank + 1).to_string()
            } else {
                format!("{}.{}", prefix, rank + 1)
            };
            let item = snapshot.get(child).unwrap();
            prop_assert_eq!(&item.wbs_number, &expected);
            stack.push((Some(child.clone()), expected));
        }
    }
    prop_assert_eq!(structure(&snapshot.clone().renumbered()), structure(snapshot));
    Ok(())
}

fn shape(node: &TreeNode) -> String {
    let children: Vec<String> = node.children.iter().map(shape).collect();
    format!("{}({})", node.item.item_type, children.join(","))
}

fn forest_ids(node: &TreeNode, out: &mut HashSet<ItemId>) {
    out.insert(node.item.id.clone());
    for child in &node.children {
        forest_ids(child, out);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn generated_outlines_are_well_formed(snapshot in outline_strategy()) {
        prop_assert!(snapshot.check_invariants().is_ok());
        check_wbs(&snapshot)?;
    }

    #[test]
    fn operations_keep_outline_valid_and_reversible(
        start in outline_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..16),
    ) {
        let mut snapshot = start;
        for op in &ops {
            if snapshot.is_empty() {
                break;
            }
            let applied = match apply(&snapshot, op) {
                Ok(applied) => applied,
                Err(e) => {
                    prop_assert!(!e.is_defect(), "{:?} reported a defect: {}", op, e);
                    continue;
                }
            };

            // Type table holds and no item is its own ancestor
            let checked = applied.snapshot.check_invariants();
            prop_assert!(checked.is_ok(), "{:?} broke the outline: {:?}", op, checked);
            check_wbs(&applied.snapshot)?;

            let undone = applied.entry.revert(&applied.snapshot).unwrap();
            prop_assert_eq!(structure(&undone), structure(&snapshot));
            let redone = applied.entry.reapply(&undone).unwrap();
            prop_assert_eq!(structure(&redone), structure(&applied.snapshot));

            snapshot = applied.snapshot;
        }
    }

    #[test]
    fn pasting_twice_yields_disjoint_isomorphic_forests(start in outline_strategy(), n in any::<usize>()) {
        let source = pick(&start, n);
        let payload = copy(&start, &[source.clone()], ClipboardMode::Copy).unwrap();
        let options = PasteOptions::default();
        let mut ids = HashIds::avoiding(start.iter().map(|i| &i.id));

        let first = paste(&start, &payload, Some(&source), DropPosition::After, &options, &mut ids).unwrap();
        let after_first = first.applied.snapshot.clone();
        let second = paste(&after_first, &payload, Some(&source), DropPosition::After, &options, &mut ids).unwrap();
        let end = second.applied.snapshot;

        let index = DescendantIndex::for_snapshot(&end);
        let original = outline::domain::build_subtree(&source, &end, &index).unwrap();
        let a = outline::domain::build_subtree(&first.roots[0], &end, &index).unwrap();
        let b = outline::domain::build_subtree(&second.roots[0], &end, &index).unwrap();

        prop_assert_eq!(shape(&a), shape(&original));
        prop_assert_eq!(shape(&b), shape(&original));
        prop_assert!(a.item.title.ends_with(" (Copy)"));

        let mut source_ids = HashSet::new();
        let mut a_ids = HashSet::new();
        let mut b_ids = HashSet::new();
        forest_ids(&original, &mut source_ids);
        forest_ids(&a, &mut a_ids);
        forest_ids(&b, &mut b_ids);
        prop_assert!(source_ids.is_disjoint(&a_ids));
        prop_assert!(source_ids.is_disjoint(&b_ids));
        prop_assert!(a_ids.is_disjoint(&b_ids));
        prop_assert!(end.check_invariants().is_ok());
    }

    #[test]
    fn history_stacks_stay_bounded(limit in 1usize..6, steps in proptest::collection::vec(0u8..3, 0..40)) {
        let mut history = History::with_limit(limit);
        let entry = HistoryEntry::new(
            outline::domain::Action::Move { changes: Vec::new() },
            "step",
        );
        for step in steps {
            match step {
                0 => {
                    history.push(entry.clone());
                    prop_assert!(!history.can_redo());
                }
                1 => {
                    let before = history.undo_len();
                    let undone = history.undo();
                    prop_assert_eq!(undone.is_some(), before > 0);
                }
                _ => {
                    let before = history.redo_len();
                    let redone = history.redo();
                    prop_assert_eq!(redone.is_some(), before > 0);
                }
            }
            prop_assert!(history.undo_len() <= limit);
        }
    }
}
