//! Undo, redo and history listing

use anyhow::Result;
use tracing::debug;

use super::output::Output;
use super::session::Session;
use crate::domain::HistoryEntry;

pub fn undo(output: &Output) -> Result<()> {
    let mut session = Session::open()?;
    let mut history = session.project().load_history()?;
    let Some(entry) = history.undo() else {
        output.success("Nothing to undo");
        return Ok(());
    };

    let restored = entry.revert(session.snapshot())?;
    session.replace_snapshot(restored)?;
    session.project().history_file().save(&history)?;
    debug!(label = %entry.label, "undone");

    output.applied(&format!("Undid: {}", describe(&entry)), &entry);
    Ok(())
}

pub fn redo(output: &Output) -> Result<()> {
    let mut session = Session::open()?;
    let mut history = session.project().load_history()?;
    let Some(entry) = history.redo() else {
        output.success("Nothing to redo");
        return Ok(());
    };

    let reapplied = entry.reapply(session.snapshot())?;
    session.replace_snapshot(reapplied)?;
    session.project().history_file().save(&history)?;
    debug!(label = %entry.label, "redone");

    output.applied(&format!("Redid: {}", describe(&entry)), &entry);
    Ok(())
}

pub fn list(output: &Output, clear: bool) -> Result<()> {
    let session = Session::open()?;
    let mut history = session.project().load_history()?;

    if clear {
        history.clear();
        session.project().history_file().save(&history)?;
        output.success("History cleared");
        return Ok(());
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "limit": history.limit(),
            "undo": history.entries().rev().map(summary).collect::<Vec<_>>(),
            "redo": history.redo_entries().rev().map(summary).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if !history.can_undo() && !history.can_redo() {
        println!("No history");
        return Ok(());
    }

    println!("Undo ({} of {}):", history.undo_len(), history.limit());
    for entry in history.entries().rev() {
        println!("  {}  {:<7} {}", entry.timestamp.format("%H:%M:%S"), entry.kind().as_str(), describe(entry));
    }
    if history.can_redo() {
        println!("Redo:");
        for entry in history.redo_entries().rev() {
            println!("  {}  {:<7} {}", entry.timestamp.format("%H:%M:%S"), entry.kind().as_str(), describe(entry));
        }
    }
    Ok(())
}

fn describe(entry: &HistoryEntry) -> String {
    if entry.label.is_empty() {
        entry.kind().as_str().to_string()
    } else {
        entry.label.clone()
    }
}

fn summary(entry: &HistoryEntry) -> serde_json::Value {
    serde_json::json!({
        "action": entry.kind().as_str(),
        "label": entry.label,
        "items": entry.action.item_ids(),
        "timestamp": entry.timestamp,
    })
}
