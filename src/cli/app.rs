//! Main CLI application structure

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use super::output::{Output, OutputFormat};
use super::{clipboard_cmd, history_cmd, item, outline_cmd};
use crate::domain::{DropPosition, ItemId, ItemStatus, ItemType, PredecessorKind};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "outline")]
#[command(author, version, about = "Typed work-item outlines with WBS numbering, reordering and undo")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where an item or selection lands
///
/// With no flag the item goes to the end of the root level.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct Placement {
    /// Place before this item, under the same parent
    #[arg(long, value_name = "ID")]
    pub before: Option<ItemId>,

    /// Place after this item, under the same parent
    #[arg(long, value_name = "ID")]
    pub after: Option<ItemId>,

    /// Place as the last child of this item
    #[arg(long, value_name = "ID", visible_alias = "inside")]
    pub into: Option<ItemId>,
}

impl Placement {
    pub fn target(&self) -> (Option<&ItemId>, DropPosition) {
        if let Some(id) = &self.before {
            (Some(id), DropPosition::Before)
        } else if let Some(id) = &self.after {
            (Some(id), DropPosition::After)
        } else if let Some(id) = &self.into {
            (Some(id), DropPosition::Inside)
        } else {
            (None, DropPosition::Inside)
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new outline project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Add an item
    ///
    /// Examples:
    ///   outline add milestone "Launch"
    ///   outline add deliverable "API" --into i-1a2b3c4
    ///   outline add task "Write docs" --after i-5d6e7f8
    Add {
        /// milestone, deliverable or task (m, d, t)
        item_type: ItemType,

        /// Item title
        title: String,

        #[command(flatten)]
        placement: Placement,

        /// Project or board the item belongs to
        #[arg(long)]
        container: Option<String>,
    },

    /// List items in outline order
    List,

    /// Show the outline as a tree
    Tree {
        /// Only show the subtree under this item
        id: Option<ItemId>,
    },

    /// Show item details
    Show {
        /// Item ID
        id: ItemId,
    },

    /// Edit item fields (structure is changed with move, promote, demote)
    Edit {
        /// Item ID
        id: ItemId,

        #[arg(long)]
        title: Option<String>,

        /// not_started, in_progress or done
        #[arg(long)]
        status: Option<ItemStatus>,

        /// Percent complete (clamped to 100)
        #[arg(long)]
        progress: Option<u8>,

        /// Collapse the item in tree views
        #[arg(long, conflicts_with = "expand")]
        collapse: bool,

        /// Expand a collapsed item
        #[arg(long)]
        expand: bool,

        /// Record where the item was published
        #[arg(long, value_name = "TARGET")]
        published_to: Option<String>,
    },

    /// Remove items and all their descendants
    Rm {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },

    /// Move items (with their subtrees) to a new place
    Move {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<ItemId>,

        #[command(flatten)]
        placement: Placement,

        /// Only check whether the move is allowed
        #[arg(long)]
        dry_run: bool,
    },

    /// Raise an item one level in the hierarchy
    Promote {
        /// Item ID
        id: ItemId,

        /// Only check whether the promotion is allowed
        #[arg(long)]
        dry_run: bool,
    },

    /// Nest an item under its previous sibling
    Demote {
        /// Item ID
        id: ItemId,

        /// Only check whether the demotion is allowed
        #[arg(long)]
        dry_run: bool,
    },

    /// Swap an item with its previous sibling
    Up {
        /// Item ID
        id: ItemId,
    },

    /// Swap an item with its next sibling
    Down {
        /// Item ID
        id: ItemId,
    },

    /// Copy items (with their subtrees) to the clipboard
    Copy {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },

    /// Cut items; the originals are removed when pasted
    Cut {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },

    /// Paste the clipboard
    Paste {
        #[command(flatten)]
        placement: Placement,

        /// Move the pasted items into this container
        #[arg(long)]
        container: Option<String>,
    },

    /// Show the clipboard contents
    Clipboard {
        /// Empty the clipboard
        #[arg(long)]
        clear: bool,
    },

    /// Undo the last change
    Undo,

    /// Redo the last undone change
    Redo,

    /// Show the undo history
    History {
        /// Forget all undo and redo entries
        #[arg(long)]
        clear: bool,
    },

    /// Make an item depend on another
    Link {
        /// Item that waits
        item: ItemId,

        /// Item that must come first
        predecessor: ItemId,

        /// FS, SS, FF or SF
        #[arg(long, default_value = "FS")]
        kind: PredecessorKind,

        /// Lag in days (negative for lead)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        lag: i32,
    },

    /// Remove a dependency
    Unlink {
        /// Item that waits
        item: ItemId,

        /// Predecessor to remove
        predecessor: ItemId,
    },

    /// Show items in dependency order
    Schedule {
        /// Only items whose predecessors are all done
        #[arg(long)]
        ready: bool,
    },

    /// Verify the stored outline
    Check,
}

/// Executes a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let format = match cli.format {
        Some(format) => format,
        None => Config::load()?.global.default_format.into(),
    };
    let output = Output::new(format);

    match cli.command {
        Commands::Init { path } => {
            debug!(path = %path, "init");
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized outline project at {}",
                project.root().display()
            ));
        }

        Commands::Add {
            item_type,
            title,
            placement,
            container,
        } => item::add(&output, item_type, &title, &placement, container)?,
        Commands::List => item::list(&output)?,
        Commands::Show { id } => item::show(&output, &id)?,
        Commands::Edit {
            id,
            title,
            status,
            progress,
            collapse,
            expand,
            published_to,
        } => {
            let collapsed = match (collapse, expand) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            item::edit(&output, &id, title, status, progress, collapsed, published_to)?
        }
        Commands::Rm { ids } => item::remove(&output, &ids)?,
        Commands::Link {
            item: id,
            predecessor,
            kind,
            lag,
        } => item::link(&output, &id, &predecessor, kind, lag)?,
        Commands::Unlink {
            item: id,
            predecessor,
        } => item::unlink(&output, &id, &predecessor)?,

        Commands::Tree { id } => outline_cmd::tree(&output, id.as_ref())?,
        Commands::Move {
            ids,
            placement,
            dry_run,
        } => outline_cmd::move_items(&output, &ids, &placement, dry_run)?,
        Commands::Promote { id, dry_run } => outline_cmd::promote(&output, &id, dry_run)?,
        Commands::Demote { id, dry_run } => outline_cmd::demote(&output, &id, dry_run)?,
        Commands::Up { id } => outline_cmd::shift(&output, &id, crate::domain::Direction::Up)?,
        Commands::Down { id } => outline_cmd::shift(&output, &id, crate::domain::Direction::Down)?,
        Commands::Schedule { ready } => outline_cmd::schedule(&output, ready)?,
        Commands::Check => outline_cmd::check(&output)?,

        Commands::Copy { ids } => clipboard_cmd::copy(&output, &ids, false)?,
        Commands::Cut { ids } => clipboard_cmd::copy(&output, &ids, true)?,
        Commands::Paste {
            placement,
            container,
        } => clipboard_cmd::paste(&output, &placement, container)?,
        Commands::Clipboard { clear } => clipboard_cmd::show(&output, clear)?,

        Commands::Undo => history_cmd::undo(&output)?,
        Commands::Redo => history_cmd::redo(&output)?,
        Commands::History { clear } => history_cmd::list(&output, clear)?,
    }

    Ok(())
}
