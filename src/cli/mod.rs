//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create `.plugshelf/` and the plugins directory |
//! | `list`, `show` | Inspect registered plugins |
//! | `duplicate` | Copy a plugin into a new one with a fresh identifier |
//! | `rename` | Rename a plugin, resolving name collisions |
//! | `watch` | Follow the plugins directory and report changes |
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Without the flag, the global config's `default_format` applies.
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) prints command context and raises the log level to
//! debug. `RUST_LOG` overrides the log level either way:
//! ```bash
//! RUST_LOG=plugshelf=trace plugshelf watch
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod plugin_cmd;
mod watch_cmd;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
