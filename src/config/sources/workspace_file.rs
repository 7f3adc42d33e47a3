//! Workspace config sources
//!
//! A workspace keeps its object database, change-memory and log under the
//! `.treexport/` state directory. Configuration is read, lowest precedence
//! first, from `config/config.toml`, `config/{TREEXPORT_ENV}.toml` and the
//! untracked `.treexport/config.toml` local to one checkout.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// State directory at the workspace root
pub const STATE_DIR: &str = ".treexport";

/// Selects `config/{name}.toml`
pub const ENV_VAR: &str = "TREEXPORT_ENV";

const DEFAULT_ENV: &str = "development";

/// Path of `name` inside the state directory, relative to the workspace root.
pub fn state_path(name: &str) -> PathBuf {
    Path::new(STATE_DIR).join(name)
}

/// Candidate workspace config files, lowest precedence first.
pub fn config_paths(workspace_root: &Path) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_VAR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    vec![
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name.trim())),
        workspace_root.join(STATE_DIR).join("config.toml"),
    ]
}

/// Add the workspace config files that exist to the builder.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for path in config_paths(workspace_root) {
        if path.is_file() {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder = builder.add_source(File::from(path).required(false));
        }
    }
    Ok(builder)
}
