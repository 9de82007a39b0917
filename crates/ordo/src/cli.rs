use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ordo: plugin load ordering and observer wiring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Simple ping command for testing
    #[arg(long)]
    pub ping: bool,

    /// Loader configuration file (defaults to ./ordo.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory scanned for plugin manifests; repeat for several.
    /// Replaces the configured directories.
    #[arg(long = "plugins-dir", global = true)]
    pub plugins_dir: Vec<PathBuf>,

    /// Environment plugins are checked against
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Leave the built-in core plugins out of the load
    #[arg(long, global = true)]
    pub no_core: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the final load order with failed and evicted plugins
    Order {
        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the observers of a plugin, in load order
    Observers {
        /// The name of the observed plugin
        name: String,
    },
    /// Apply every plugin's contribution to a descriptor document
    Descriptor {
        /// Document to transform; the format follows its extension
        file: PathBuf,
    },
}
