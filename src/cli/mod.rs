//! # Command-Line Interface
//!
//! The `outline` binary: each command reads the whole snapshot, runs one
//! domain operation and writes the result back.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup and checks | `init`, `check` |
//! | Items | Create, edit, remove | `add`, `edit`, `rm`, `show`, `list` |
//! | Structure | Reordering and nesting | `move`, `promote`, `demote`, `up`, `down`, `tree` |
//! | Clipboard | Duplicating subtrees | `copy`, `cut`, `paste`, `clipboard` |
//! | History | Undo and redo | `undo`, `redo`, `history` |
//! | Dependencies | Predecessor links | `link`, `unlink`, `schedule` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The global config's `default_format` applies when the flag is absent.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr:
//! ```bash
//! outline --verbose promote i-1a2b3c4
//! ```

mod app;
mod clipboard_cmd;
mod history_cmd;
mod item;
mod outline_cmd;
mod output;
mod session;

pub use app::{run, Cli, Commands, Placement};
pub use output::{Output, OutputFormat};
