//! Main CLI application structure

use clap::{Parser, Subcommand};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{plugin_cmd, watch_cmd};
use crate::storage::{Config, Library};

#[derive(Parser)]
#[command(name = "plugshelf")]
#[command(author, version, about = "Manage a directory of plugin bundles")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new plugin library
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// List registered plugins
    List,

    /// Show a plugin's details
    Show {
        /// Plugin name
        name: String,
    },

    /// Copy a plugin into a new, independent plugin
    Duplicate {
        /// Name of the plugin to copy
        name: String,
    },

    /// Rename a plugin, picking a free name if the requested one is taken
    Rename {
        /// Current plugin name
        name: String,

        /// Requested new name
        new_name: String,
    },

    /// Watch the plugins directory and report changes
    Watch,
}

/// Installs the stderr log subscriber
///
/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_directive = if verbose { "plugshelf=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()
            .map(|global| OutputFormat::from(global.default_format))
            .unwrap_or_default(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("plugshelf starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing library at: {}", path));
            let library = Library::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Plugins directory: {}", library.plugins_dir().display()),
            );
            output.success(&format!("Initialized plugshelf library at {}", library.root().display()));
        }

        Commands::List => plugin_cmd::list(&output)?,

        Commands::Show { name } => plugin_cmd::show(&output, &name)?,

        Commands::Duplicate { name } => {
            output.verbose_ctx("duplicate", &format!("Duplicating: {}", name));
            plugin_cmd::duplicate(&output, &name)?
        }

        Commands::Rename { name, new_name } => {
            output.verbose_ctx("rename", &format!("Renaming '{}' to '{}'", name, new_name));
            plugin_cmd::rename(&output, &name, &new_name)?
        }

        Commands::Watch => watch_cmd::run(&output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
