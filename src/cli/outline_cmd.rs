//! Structure commands: tree view, moves, dependency order and checks

use anyhow::Result;

use super::app::Placement;
use super::output::Output;
use super::session::Session;
use crate::domain::{self, Applied, DependencyGraph, DescendantIndex, Direction, ItemId};

pub fn tree(output: &Output, root: Option<&ItemId>) -> Result<()> {
    let session = Session::open()?;
    let snapshot = session.snapshot().clone().renumbered();

    let nodes: Vec<domain::TreeNode> = match root {
        Some(id) => {
            snapshot.require(id)?;
            let index = DescendantIndex::for_snapshot(&snapshot);
            domain::build_subtree(id, &snapshot, &index).into_iter().collect()
        }
        None => domain::build_tree(snapshot.items()),
    };

    if output.is_json() {
        output.data(&nodes);
    } else if nodes.is_empty() {
        println!("Outline is empty");
    } else {
        print!("{}", domain::render_tree(&nodes));
    }
    Ok(())
}

pub fn move_items(output: &Output, ids: &[ItemId], placement: &Placement, dry_run: bool) -> Result<()> {
    let mut session = Session::open()?;
    let (target, position) = placement.target();

    if dry_run {
        domain::check_drag_drop(session.snapshot(), ids, target, position)?;
        output.success("Move allowed");
        return Ok(());
    }

    let applied = domain::drag_drop(session.snapshot(), ids, target, position)?;
    report(output, &mut session, applied, "Already in place")
}

pub fn promote(output: &Output, id: &ItemId, dry_run: bool) -> Result<()> {
    let mut session = Session::open()?;
    if dry_run {
        domain::check_promote(session.snapshot(), id)?;
        output.success(&format!("{} can be promoted", id));
        return Ok(());
    }

    let applied = domain::promote(session.snapshot(), id)?;
    report(output, &mut session, applied, "Nothing to promote")
}

pub fn demote(output: &Output, id: &ItemId, dry_run: bool) -> Result<()> {
    let mut session = Session::open()?;
    if dry_run {
        domain::check_demote(session.snapshot(), id)?;
        output.success(&format!("{} can be demoted", id));
        return Ok(());
    }

    let applied = domain::demote(session.snapshot(), id)?;
    report(output, &mut session, applied, "Nothing to demote")
}

/// Keyboard-style move: swap with the adjacent sibling
pub fn shift(output: &Output, id: &ItemId, direction: Direction) -> Result<()> {
    let mut session = Session::open()?;
    let applied = match direction {
        Direction::Up => domain::move_up(session.snapshot(), id)?,
        Direction::Down => domain::move_down(session.snapshot(), id)?,
    };
    report(output, &mut session, applied, "Already in place")
}

fn report(output: &Output, session: &mut Session, applied: Applied, unchanged: &str) -> Result<()> {
    let entry = session.commit(applied)?;
    if entry.is_noop() {
        output.success(unchanged);
        return Ok(());
    }

    let moved = entry.action.item_ids();
    let summary: Vec<String> = moved
        .iter()
        .filter_map(|id| session.snapshot().get(id))
        .map(|item| format!("{} {} {}", item.wbs_number, item.id, item.title))
        .collect();

    output.applied(&format!("Applied: {}", entry.label), &entry);
    if !output.is_json() {
        for line in summary {
            println!("  {}", line);
        }
    }
    Ok(())
}

pub fn schedule(output: &Output, ready_only: bool) -> Result<()> {
    let session = Session::open()?;
    let snapshot = session.snapshot().clone().renumbered();
    let graph = DependencyGraph::from_items(snapshot.iter());

    let ids = if ready_only {
        graph.ready_items(&snapshot)
    } else {
        graph.schedule_order()?
    };
    let items: Vec<_> = ids.iter().filter_map(|id| snapshot.get(id)).collect();

    if output.is_json() {
        output.data(&items);
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", if ready_only { "Nothing ready" } else { "Outline is empty" });
        return Ok(());
    }
    for item in items {
        output.item_row(item);
    }
    Ok(())
}

pub fn check(output: &Output) -> Result<()> {
    let session = Session::open()?;
    let snapshot = session.snapshot();
    snapshot.check_invariants()?;
    DependencyGraph::from_items(snapshot.iter()).schedule_order()?;

    let dangling: Vec<(ItemId, ItemId)> = snapshot
        .iter()
        .flat_map(|item| {
            item.predecessors
                .iter()
                .filter(|p| !snapshot.contains(&p.item))
                .map(|p| (item.id.clone(), p.item.clone()))
        })
        .collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "ok": true,
            "items": snapshot.len(),
            "dangling_links": dangling
                .iter()
                .map(|(item, pred)| serde_json::json!({ "item": item, "predecessor": pred }))
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output.success(&format!("Outline OK ({} items)", snapshot.len()));
    for (item, pred) in &dangling {
        println!("  note: {} depends on removed item {}", item, pred);
    }
    Ok(())
}
