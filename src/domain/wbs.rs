//! WBS (outline) numbering
//!
//! Root siblings are numbered `1, 2, 3, ...`; every other item gets its
//! parent's number plus `.{rank}` where rank is its 1-based position among
//! siblings. Numbers depend only on parent chain and sibling rank, never on
//! the order of the flat list.

use std::collections::HashMap;

use super::id::ItemId;
use super::index::DescendantIndex;
use super::item::Item;

/// Computes the WBS number of every reachable item
///
/// Items caught in a parent cycle are unreachable from the roots and get no
/// number.
pub fn wbs_numbers(items: &[Item]) -> HashMap<ItemId, String> {
    let index = DescendantIndex::build(items);
    let mut numbers = HashMap::with_capacity(items.len());

    let mut stack: Vec<(&ItemId, String)> = index
        .roots()
        .iter()
        .enumerate()
        .rev()
        .map(|(rank, id)| (id, (rank + 1).to_string()))
        .collect();

    while let Some((id, number)) = stack.pop() {
        if numbers.contains_key(id) {
            continue;
        }
        for (rank, child) in index.children_of(Some(id)).iter().enumerate().rev() {
            stack.push((child, format!("{}.{}", number, rank + 1)));
        }
        numbers.insert(id.clone(), number);
    }

    numbers
}

/// Returns a copy of `items` with every `wbs_number` replaced
pub fn assign_wbs(items: &[Item]) -> Vec<Item> {
    let numbers = wbs_numbers(items);
    items
        .iter()
        .map(|item| {
            let mut item = item.clone();
            item.wbs_number = numbers.get(&item.id).cloned().unwrap_or_default();
            item
        })
        .collect()
}

/// Compares two WBS numbers segment by segment (`1.10` sorts after `1.9`)
pub fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |s: &str| -> Vec<u64> { s.split('.').filter_map(|p| p.parse().ok()).collect() };
    parse(a).cmp(&parse(b))
}
