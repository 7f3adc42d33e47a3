//! Progress reporting to the hosting node

use crate::error::ExportError;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error};

/// Receives progress and failures from an export hook.
pub trait ProgressTarget: Send + Sync {
    /// Filesystem path of the destination root
    fn set_export_path(&self, path: &str);

    /// Busy indicator, true while an export runs
    fn set_pulse(&self, busy: bool);

    /// Failure channel for restoration and export errors
    fn fail(&self, error: &ExportError);
}

/// Observable state of a [`ProgressNode`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub export_path: Option<String>,
    pub pulse: bool,
    pub failures: Vec<String>,
}

/// Progress target that records what it is told and mirrors it to the log.
#[derive(Debug, Default)]
pub struct ProgressNode {
    label: String,
    state: Mutex<ProgressSnapshot>,
}

impl ProgressNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: Mutex::new(ProgressSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().clone()
    }

    pub fn export_path(&self) -> Option<String> {
        self.state.lock().export_path.clone()
    }

    pub fn pulse(&self) -> bool {
        self.state.lock().pulse
    }

    pub fn failures(&self) -> Vec<String> {
        self.state.lock().failures.clone()
    }
}

impl ProgressTarget for ProgressNode {
    fn set_export_path(&self, path: &str) {
        self.state.lock().export_path = Some(path.to_string());
    }

    fn set_pulse(&self, busy: bool) {
        debug!(node = %self.label, busy, "Pulse");
        self.state.lock().pulse = busy;
    }

    fn fail(&self, err: &ExportError) {
        error!(node = %self.label, error = %err, "Export failed");
        self.state.lock().failures.push(err.to_string());
    }
}
