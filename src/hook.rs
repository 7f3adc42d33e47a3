//! Export hook
//!
//! Binds a destination root, restored from a persisted token, to an
//! [`Exporter`]. Each trigger exports the configured source subtree onto that
//! root and reports through a [`ProgressTarget`].

use crate::dest::{DestDir, DestinationFs};
use crate::error::ExportError;
use crate::export::{ExportReport, Exporter};
use crate::progress::ProgressTarget;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Persisted hook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Opaque token restoring the destination root
    pub entry: String,
    /// Logical path of the subtree to export
    pub source: String,
    /// Name given to the subtree under the destination root
    pub name: String,
}

enum HookState {
    Restoring,
    Ready(Arc<dyn DestDir>),
    /// Restoration failed; the hook never exports
    Inert,
}

pub struct ExportHook {
    settings: ExportSettings,
    progress: Arc<dyn ProgressTarget>,
    exporter: Exporter,
    state: watch::Sender<HookState>,
    binding: Mutex<Option<JoinHandle<()>>>,
}

impl ExportHook {
    /// Create a hook and start restoring its destination root.
    ///
    /// Must be called inside a tokio runtime. When `initial` is given, one
    /// export runs with it as soon as the root is restored.
    pub fn bind(
        progress: Arc<dyn ProgressTarget>,
        settings: ExportSettings,
        destination: Arc<dyn DestinationFs>,
        exporter: Exporter,
        initial: Option<serde_json::Value>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(HookState::Restoring);
        let hook = Arc::new(Self {
            settings,
            progress,
            exporter,
            state,
            binding: Mutex::new(None),
        });

        let task_hook = Arc::clone(&hook);
        let handle = tokio::spawn(async move {
            match destination.restore(&task_hook.settings.entry).await {
                Ok(root) => {
                    debug!(root = %root.full_path(), "Destination restored");
                    task_hook.state.send_replace(HookState::Ready(root));
                    if let Some(config) = initial {
                        task_hook.trigger(config).await;
                    }
                }
                Err(err) => {
                    warn!(token = %task_hook.settings.entry, error = %err, "Destination restore failed");
                    task_hook.progress.fail(&err);
                    task_hook.state.send_replace(HookState::Inert);
                }
            }
        });
        *hook.binding.lock() = Some(handle);
        hook
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), HookState::Ready(_))
    }

    /// Wait for restoration to end; true when the hook is ready.
    pub async fn wait_restored(&self) -> bool {
        let mut rx = self.state.subscribe();
        let ready = match rx
            .wait_for(|state| !matches!(state, HookState::Restoring))
            .await
        {
            Ok(state) => matches!(*state, HookState::Ready(_)),
            Err(_) => false,
        };
        ready
    }

    /// Wait for the binding task, including the initial export if any.
    pub async fn wait_bound(&self) {
        let handle = self.binding.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Binding task ended abnormally");
            }
        }
    }

    /// Export the configured subtree onto the restored root.
    ///
    /// Returns `None` without doing anything while the root is not available.
    /// Failures are also forwarded to the progress target.
    pub async fn trigger(
        &self,
        config: serde_json::Value,
    ) -> Option<Result<ExportReport, ExportError>> {
        let root = match &*self.state.borrow() {
            HookState::Ready(root) => Arc::clone(root),
            HookState::Restoring | HookState::Inert => return None,
        };

        let export_path = root.full_path();
        self.progress.set_export_path(&export_path);
        self.progress.set_pulse(true);
        info!(
            source = %self.settings.source,
            dest = %export_path,
            name = %self.settings.name,
            config = %config,
            "Export requested"
        );

        let outcome = self
            .exporter
            .export_path(&self.settings.source, root, &self.settings.name)
            .await;
        self.progress.set_pulse(false);

        match &outcome {
            Ok(report) => info!(
                written = report.files_written,
                skipped = report.files_skipped,
                elapsed_ms = report.elapsed_ms,
                "Export finished"
            ),
            Err(err) => self.progress.fail(err),
        }
        Some(outcome)
    }
}
