//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_entry_json, format_entry_text, format_report_json, format_report_text,
    format_roots_json, format_roots_text,
};
use crate::config::{ChangeMemoryBackend, ConfigLoader, ExportConfig};
use crate::dest::LocalFs;
use crate::error::{ExportError, StorageError};
use crate::export::Exporter;
use crate::hook::{ExportHook, ExportSettings};
use crate::memory::{ChangeMemory, InMemoryChangeMemory, SledChangeMemory};
use crate::progress::ProgressNode;
use crate::store::ObjectDb;
use crate::tree::builder::SnapshotBuilder;
use crate::tree::path;
use crate::types::hash_hex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, loaded config and storage.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ExportConfig,
    objects: ObjectDb,
    memory: Arc<dyn ChangeMemory>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ExportError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ExportError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        let storage = config.storage.resolve_paths(&workspace_root);
        let objects = ObjectDb::new(&storage.object_db)?;
        let memory: Arc<dyn ChangeMemory> = match storage.change_memory {
            ChangeMemoryBackend::Memory => Arc::new(InMemoryChangeMemory::new()),
            ChangeMemoryBackend::Sled => {
                let db = sled::open(&storage.change_memory_path).map_err(StorageError::from)?;
                Arc::new(SledChangeMemory::new(&db)?)
            }
        };
        debug!(
            object_db = %storage.object_db.display(),
            change_memory = ?storage.change_memory,
            "Storage opened"
        );

        Ok(Self {
            workspace_root,
            config,
            objects,
            memory,
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn objects(&self) -> &ObjectDb {
        &self.objects
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ExportError> {
        let started = Instant::now();
        let result = match command {
            Commands::Snapshot { dir, root } => self.handle_snapshot(dir, root),
            Commands::Export {
                source,
                dest,
                name,
                format,
            } => self.handle_export(source.as_deref(), dest.as_deref(), name.as_deref(), format),
            Commands::Roots { format } => self.handle_roots(format),
            Commands::Show { path, format } => self.handle_show(path, format),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_snapshot(&self, dir: &Path, root: &str) -> Result<String, ExportError> {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.workspace_root.join(dir)
        };
        let entry = SnapshotBuilder::new(dir).import(&self.objects, root)?;
        Ok(format!("{} {}", root, hash_hex(&entry.hash)))
    }

    fn handle_export(
        &self,
        source: Option<&str>,
        dest: Option<&Path>,
        name: Option<&str>,
        format: &str,
    ) -> Result<String, ExportError> {
        let source = source
            .map(str::to_string)
            .or_else(|| self.config.source.clone())
            .ok_or_else(|| {
                ExportError::ConfigError(
                    "No source: pass --source or set `source` in the configuration".to_string(),
                )
            })?;
        let dest = dest
            .map(Path::to_path_buf)
            .or_else(|| self.config.destination.clone())
            .ok_or_else(|| {
                ExportError::ConfigError(
                    "No destination: pass --dest or set `destination` in the configuration"
                        .to_string(),
                )
            })?;
        let name = name
            .map(str::to_string)
            .or_else(|| self.config.name.clone())
            .or_else(|| path::components(&source).pop())
            .ok_or_else(|| {
                ExportError::ConfigError("No name: pass --name for the exported tree".to_string())
            })?;

        let settings = ExportSettings {
            entry: dest.to_string_lossy().into_owned(),
            source,
            name,
        };
        let exporter = Exporter::new(Arc::new(self.objects.clone()), Arc::clone(&self.memory))
            .with_policy(self.config.export.failure_policy)
            .with_max_symlink_depth(self.config.export.max_symlink_depth);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ExportError::ConfigError(format!("Failed to start runtime: {}", e)))?;

        let (report, export_path) = runtime.block_on(async move {
            let progress = Arc::new(ProgressNode::new(settings.name.clone()));
            let hook = ExportHook::bind(
                progress.clone(),
                settings.clone(),
                Arc::new(LocalFs),
                exporter,
                None,
            );
            if !hook.wait_restored().await {
                return Err(ExportError::RestoreFailed(settings.entry.clone()));
            }
            let config = json!({ "trigger": "cli", "source": settings.source });
            match hook.trigger(config).await {
                Some(outcome) => Ok((outcome?, progress.export_path().unwrap_or_default())),
                None => Err(ExportError::RestoreFailed(settings.entry.clone())),
            }
        })?;

        self.objects.flush()?;
        if format == "json" {
            Ok(format_report_json(&report, &export_path))
        } else {
            Ok(format_report_text(&report, &export_path))
        }
    }

    fn handle_roots(&self, format: &str) -> Result<String, ExportError> {
        let roots = self.objects.roots()?;
        if format == "json" {
            Ok(format_roots_json(&roots))
        } else {
            Ok(format_roots_text(&roots))
        }
    }

    fn handle_show(&self, logical_path: &str, format: &str) -> Result<String, ExportError> {
        let resolved = self
            .objects
            .resolve_path(logical_path)?
            .ok_or_else(|| ExportError::SourceNotFound(logical_path.to_string()))?;
        if format == "json" {
            Ok(format_entry_json(logical_path, &resolved))
        } else {
            Ok(format_entry_text(logical_path, &resolved))
        }
    }
}
