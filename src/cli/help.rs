//! CLI help and command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string recorded with each run (e.g. "export", "roots").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Snapshot { .. } => "snapshot",
        Commands::Export { .. } => "export",
        Commands::Roots { .. } => "roots",
        Commands::Show { .. } => "show",
    }
}
