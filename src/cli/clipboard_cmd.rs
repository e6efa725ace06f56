//! Clipboard CLI commands
//!
//! The clipboard is a project-local JSON document. A cut keeps the source
//! ids; the first paste deletes the originals as a separate undo step and
//! turns the clipboard into a plain copy.

use anyhow::{Context, Result};
use tracing::debug;

use super::app::Placement;
use super::output::Output;
use super::session::Session;
use crate::domain::{self, ClipboardMode, ItemId};

pub fn copy(output: &Output, ids: &[ItemId], cut: bool) -> Result<()> {
    let session = Session::open()?;
    let mode = if cut { ClipboardMode::Cut } else { ClipboardMode::Copy };
    let payload = domain::copy(session.snapshot(), ids, mode)?;
    session.project().clipboard_file().save(&payload)?;

    let verb = if cut { "Cut" } else { "Copied" };
    let count = payload.len();
    if output.is_json() {
        output.data(&serde_json::json!({
            "mode": mode.as_str(),
            "roots": payload.roots.iter().map(|n| &n.item.id).collect::<Vec<_>>(),
            "items": count,
        }));
    } else {
        output.success(&format!(
            "{} {} item{} to the clipboard",
            verb,
            count,
            if count == 1 { "" } else { "s" }
        ));
    }
    Ok(())
}

pub fn paste(output: &Output, placement: &Placement, container: Option<String>) -> Result<()> {
    let mut session = Session::open()?;
    let clipboard = session.project().clipboard_file();
    let payload = clipboard
        .load()?
        .filter(|p| !p.is_empty())
        .context("Clipboard is empty. Use 'outline copy' or 'outline cut' first.")?;

    let mut options = session.project().config().project.clipboard.paste_options();
    options.container_id = container;

    let (target, position) = placement.target();
    let mut ids = session.ids();
    let pasted = domain::paste(session.snapshot(), &payload, target, position, &options, &mut ids)?;
    let roots = pasted.roots.clone();
    let entry = session.commit(pasted.applied)?;

    let removed = match domain::remove_cut_sources(session.snapshot(), &payload)? {
        Some(applied) => {
            let removal = session.commit(applied)?;
            clipboard.save(&payload.into_copy())?;
            debug!(removed = removal.action.item_ids().len(), "cut sources removed");
            Some(removal)
        }
        None => None,
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "success": true,
            "roots": roots,
            "items": entry.action.item_ids(),
            "removed": removed.map(|r| r.action.item_ids()).unwrap_or_default(),
        }));
        return Ok(());
    }

    output.success(&format!("Pasted {} item{}", entry.action.item_ids().len(), plural(&entry)));
    for id in &roots {
        if let Some(item) = session.snapshot().get(id) {
            println!("  {} {} {}", item.wbs_number, item.id, item.title);
        }
    }
    if let Some(removal) = removed {
        println!("Removed {} cut original(s)", removal.action.item_ids().len());
    }
    Ok(())
}

fn plural(entry: &domain::HistoryEntry) -> &'static str {
    if entry.action.item_ids().len() == 1 {
        ""
    } else {
        "s"
    }
}

pub fn show(output: &Output, clear: bool) -> Result<()> {
    let session = Session::open()?;
    let clipboard = session.project().clipboard_file();

    if clear {
        let had = clipboard.clear()?;
        output.success(if had { "Clipboard cleared" } else { "Clipboard already empty" });
        return Ok(());
    }

    match clipboard.load()? {
        Some(payload) if output.is_json() => output.data(&payload),
        Some(payload) if !payload.is_empty() => {
            println!(
                "{} ({} items, {})",
                payload.mode.as_str(),
                payload.len(),
                payload.copied_at.format("%Y-%m-%d %H:%M")
            );
            print!("{}", domain::render_tree(&payload.roots));
        }
        _ if output.is_json() => output.data(&serde_json::Value::Null),
        _ => println!("Clipboard is empty"),
    }
    Ok(())
}
