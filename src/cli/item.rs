//! Item CLI commands

use anyhow::Result;

use super::app::Placement;
use super::output::Output;
use super::session::Session;
use crate::domain::{
    self, DependencyGraph, ItemId, ItemStatus, ItemType, NewItem, Predecessor, PredecessorKind,
    UpdateItem,
};

pub fn add(
    output: &Output,
    item_type: ItemType,
    title: &str,
    placement: &Placement,
    container: Option<String>,
) -> Result<()> {
    let mut session = Session::open()?;
    let mut new = NewItem::new(item_type, title);
    new.container_id = container;

    let (target, position) = placement.target();
    let mut ids = session.ids();
    let applied = domain::insert_item(session.snapshot(), new, target, position, &mut ids)?;
    let entry = session.commit(applied)?;

    let created = entry
        .action
        .item_ids()
        .into_iter()
        .next()
        .and_then(|id| session.snapshot().get(&id).cloned());

    match created {
        Some(item) if output.is_json() => output.data(&item),
        Some(item) => output.success(&format!(
            "Created {} {} {} - {}",
            item.item_type, item.wbs_number, item.id, item.title
        )),
        None => output.success("Nothing created"),
    }
    Ok(())
}

pub fn list(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let snapshot = session.snapshot().clone().renumbered();
    let order = domain::DescendantIndex::for_snapshot(&snapshot).outline_order();
    let items: Vec<_> = order.iter().filter_map(|id| snapshot.get(id)).collect();

    if output.is_json() {
        output.data(&items);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items. Add one with 'outline add milestone <title>'.");
        return Ok(());
    }

    println!("{:<8} {:<10} {:<12} {:<12} TITLE", "WBS", "ID", "TYPE", "STATUS");
    println!("{}", "-".repeat(60));
    for item in items {
        output.item_row(item);
    }
    Ok(())
}

pub fn show(output: &Output, id: &ItemId) -> Result<()> {
    let session = Session::open()?;
    let snapshot = session.snapshot().clone().renumbered();
    let item = snapshot.require(id)?;

    if output.is_json() {
        output.data(item);
        return Ok(());
    }

    println!("{} {}", item.id, item.title);
    println!("  Type:     {}", item.item_type);
    if !item.wbs_number.is_empty() {
        println!("  WBS:      {}", item.wbs_number);
    }
    match item.parent_id.as_ref().and_then(|p| snapshot.get(p)) {
        Some(parent) => println!("  Parent:   {} ({})", parent.id, parent.title),
        None => println!("  Parent:   (root)"),
    }
    println!("  Status:   {}", item.status.as_str());
    if item.progress > 0 {
        println!("  Progress: {}%", item.progress);
    }
    if let Some(container) = &item.container_id {
        println!("  Container: {}", container);
    }
    if let Some(published) = &item.published_to {
        println!("  Published: {}", published);
    }
    println!("  Created:  {}", item.created_at.format("%Y-%m-%d %H:%M"));

    let children = domain::DescendantIndex::for_snapshot(&snapshot)
        .children_of(Some(id))
        .len();
    if children > 0 {
        println!("  Children: {}", children);
    }

    if !item.predecessors.is_empty() {
        output.blank();
        println!("  Depends on:");
        for pred in &item.predecessors {
            let title = snapshot
                .get(&pred.item)
                .map(|p| p.title.as_str())
                .unwrap_or("(missing)");
            let lag = if pred.lag != 0 {
                format!(" {:+}d", pred.lag)
            } else {
                String::new()
            };
            println!("    {} {}{} - {}", pred.kind.label(), pred.item, lag, title);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    output: &Output,
    id: &ItemId,
    title: Option<String>,
    status: Option<ItemStatus>,
    progress: Option<u8>,
    collapsed: Option<bool>,
    published_to: Option<String>,
) -> Result<()> {
    let update = UpdateItem {
        title,
        status,
        progress,
        collapsed,
        published_to,
    };
    if update.is_empty() {
        anyhow::bail!("Nothing to change. Pass --title, --status, --progress, --collapse, --expand or --published-to.");
    }

    let mut session = Session::open()?;
    let applied = domain::update_item(session.snapshot(), id, &update)?;
    let entry = session.commit(applied)?;
    if entry.is_noop() {
        output.success(&format!("{} unchanged", id));
    } else {
        output.applied(&format!("Updated {}", id), &entry);
    }
    Ok(())
}

pub fn remove(output: &Output, ids: &[ItemId]) -> Result<()> {
    let mut session = Session::open()?;
    let applied = domain::remove_items(session.snapshot(), ids)?;
    let entry = session.commit(applied)?;
    let count = entry.action.item_ids().len();
    output.applied(
        &format!("Removed {} item{}", count, if count == 1 { "" } else { "s" }),
        &entry,
    );
    Ok(())
}

pub fn link(
    output: &Output,
    id: &ItemId,
    predecessor: &ItemId,
    kind: PredecessorKind,
    lag: i32,
) -> Result<()> {
    let mut session = Session::open()?;
    let link = Predecessor {
        item: predecessor.clone(),
        kind,
        lag,
    };
    let applied = domain::link_predecessor(session.snapshot(), id, link)?;
    let entry = session.commit(applied)?;
    if entry.is_noop() {
        output.success(&format!("{} already depends on {}", id, predecessor));
    } else {
        output.applied(
            &format!("{} now depends on {} ({})", id, predecessor, kind.label()),
            &entry,
        );
    }
    Ok(())
}

pub fn unlink(output: &Output, id: &ItemId, predecessor: &ItemId) -> Result<()> {
    let mut session = Session::open()?;
    let applied = domain::unlink_predecessor(session.snapshot(), id, predecessor)?;
    let entry = session.commit(applied)?;
    if entry.is_noop() {
        output.success(&format!("{} does not depend on {}", id, predecessor));
    } else {
        output.applied(&format!("Removed dependency {} -> {}", predecessor, id), &entry);
    }

    if output.is_json() {
        return Ok(());
    }
    let remaining = DependencyGraph::from_items(session.snapshot().iter()).predecessors_of(id);
    if !remaining.is_empty() {
        let list: Vec<String> = remaining.iter().map(ToString::to_string).collect();
        println!("Still depends on: {}", list.join(", "));
    }
    Ok(())
}
