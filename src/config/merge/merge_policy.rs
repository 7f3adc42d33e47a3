//! Merge rules: defaults, override order, conflict handling.

use crate::config::sources::workspace_file::state_path;
use crate::export::DEFAULT_MAX_SYMLINK_DEPTH;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace individual keys, never whole sections.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("export.failure_policy", "fail_fast")?
        .set_default("export.max_symlink_depth", DEFAULT_MAX_SYMLINK_DEPTH as u64)?
        .set_default("storage.object_db", state_path("objects").to_string_lossy().into_owned())?
        .set_default("storage.change_memory", "memory")?
        .set_default(
            "storage.change_memory_path",
            state_path("memory").to_string_lossy().into_owned(),
        )
}
