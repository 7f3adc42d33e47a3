//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_entry_json, format_entry_text, format_report_json, format_report_text,
    format_roots_json, format_roots_text,
};
pub use route::RunContext;
