//! Per-user config source: `$XDG_CONFIG_HOME/treexport/config.toml`, falling
//! back to `~/.config/treexport/config.toml`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::PathBuf;
use tracing::debug;

const APP_DIR: &str = "treexport";

/// Path to the per-user config file, if a config home can be found.
pub fn global_config_path() -> Option<PathBuf> {
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|home| !home.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })?;
    Some(config_home.join(APP_DIR).join("config.toml"))
}

/// Add the per-user config file to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match global_config_path() {
        Some(path) if path.is_file() => {
            let canonical = dunce::canonicalize(&path).unwrap_or(path);
            debug!(config_path = %canonical.display(), "Adding user configuration");
            builder = builder.add_source(File::from(canonical).required(false));
        }
        Some(path) => debug!(config_path = %path.display(), "No user configuration file"),
        None => debug!("No config home; skipping user configuration"),
    }
    Ok(builder)
}
