//! Output formatting for CLI commands
//!
//! Text goes to stdout for people; `--format json` prints one JSON document
//! per line so `watch` output can be streamed into other tools. Warnings and
//! verbose notes always go to stderr.

use serde::Serialize;
use tracing::warn;

use crate::storage;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Formatter shared by every command
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Confirms a completed change, e.g. `Renamed 'Print' to 'Printer'`
    pub fn success(&self, message: &str) {
        if self.is_json() {
            self.data(&serde_json::json!({
                "success": true,
                "message": message,
            }));
        } else {
            println!("{}", message);
        }
    }

    /// Bundle-level problem that does not fail the command
    ///
    /// Silent in JSON mode; commands report these in their payload there.
    pub fn warn(&self, message: &str) {
        if !self.is_json() {
            eprintln!("Warning: {}", message);
        }
    }

    /// Prints one compact JSON document on its own line
    pub fn data<T: Serialize>(&self, data: &T) {
        match serde_json::to_string(data) {
            Ok(json) => println!("{}", json),
            Err(error) => warn!(%error, "could not serialize command output"),
        }
    }

    /// Prints a note only when `--verbose` is set
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Same as [`Output::verbose`], tagged with the command name
    pub fn verbose_ctx(&self, command: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", command, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_format_maps_onto_cli_format() {
        assert_eq!(OutputFormat::from(storage::OutputFormat::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(storage::OutputFormat::Text), OutputFormat::Text);
    }

    #[test]
    fn json_mode_is_reported() {
        assert!(Output::new(OutputFormat::Json, false).is_json());
        assert!(!Output::new(OutputFormat::Text, true).is_json());
    }
}
