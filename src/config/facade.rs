//! Layered configuration loading

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::ExportConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ExportConfig`] from defaults, files and environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, `config/{TREEXPORT_ENV}.toml`, then
    /// `TREEXPORT__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ExportConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: ExportConfig = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single explicit file over the defaults
    pub fn load_from_file(path: &Path) -> Result<ExportConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    pub fn default() -> ExportConfig {
        ExportConfig::default()
    }

    /// Location of the per-user configuration file, when HOME is known
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TREEXPORT")
        .separator("__")
        .try_parsing(true)
}
