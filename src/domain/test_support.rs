//! Fixtures shared by the domain unit tests

use super::id::ItemId;
use super::item::{Item, ItemType};
use super::snapshot::Snapshot;

pub(crate) fn id(s: &str) -> ItemId {
    s.parse().expect("valid test id")
}

pub(crate) fn ids(list: &[&str]) -> Vec<ItemId> {
    list.iter().map(|s| id(s)).collect()
}

pub(crate) fn item(s: &str, item_type: ItemType, parent: Option<&str>, sort_order: i64) -> Item {
    let mut item = Item::new(id(s), item_type, s).with_order(sort_order);
    item.parent_id = parent.map(id);
    item
}

/// M1 Plan > D1 Design > (T1 Sketch, T2 Review); M2 Ship
pub(crate) fn sample() -> Snapshot {
    let titled = |mut item: Item, title: &str| {
        item.title = title.to_string();
        item
    };
    Snapshot::from_items(vec![
        titled(item("M1", ItemType::Milestone, None, 1), "Plan"),
        titled(item("D1", ItemType::Deliverable, Some("M1"), 2), "Design"),
        titled(item("T1", ItemType::Task, Some("D1"), 3), "Sketch"),
        titled(item("T2", ItemType::Task, Some("D1"), 4), "Review"),
        titled(item("M2", ItemType::Milestone, None, 5), "Ship"),
    ])
}
