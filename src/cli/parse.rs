//! CLI parse: clap types for treexport. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// treexport CLI - export stored source trees onto the local filesystem
#[derive(Parser)]
#[command(name = "treexport")]
#[command(about = "Export content-addressed source trees, rewriting only what changed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a local directory into the object database as a named root
    Snapshot {
        /// Directory to import
        dir: PathBuf,
        /// Root name the snapshot is registered under
        #[arg(long)]
        root: String,
    },
    /// Export a stored subtree onto a destination directory
    Export {
        /// Logical source path, `<root>/<path>` (default: config `source`)
        #[arg(long)]
        source: Option<String>,
        /// Destination directory (default: config `destination`)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Name of the exported subtree under the destination
        #[arg(long)]
        name: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List named roots
    Roots {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the entry stored at a logical path
    Show {
        /// Logical path, `<root>/<path>`
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
