//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ExportError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ExportError) -> String {
    match e {
        ExportError::SourceNotFound(_) => {
            format!("{}\nRun `treexport roots` to list available roots.", e)
        }
        _ => e.to_string(),
    }
}
