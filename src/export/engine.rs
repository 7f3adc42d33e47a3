//! Recursive tree, file and symlink export

use crate::dest::DestDir;
use crate::error::{ExportError, FileStage};
use crate::export::report::{ExportReport, ExportStats};
use crate::memory::ChangeMemory;
use crate::store::PathResolver;
use crate::tree::{path, Content, Entry, EntryMode, Resolved};
use crate::types::{short_hex, Hash};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, trace, warn};

/// Symlink hops allowed along one descent chain before giving up.
pub const DEFAULT_MAX_SYMLINK_DEPTH: usize = 40;

/// What an export does with its remaining work once one branch fails.
///
/// Either way the first error is the one reported, exactly once, and a file
/// whose write has started is always truncated before the export returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abandon resolution and blob loads still in flight anywhere in the
    /// export; file writes already under way run through truncation
    #[default]
    FailFast,
    /// Let siblings run to completion and discard their outcomes
    DrainSiblings,
}

/// State shared by every branch of one export.
struct ExportRun {
    stats: ExportStats,
    abandon: watch::Sender<bool>,
}

impl ExportRun {
    fn new() -> Self {
        let (abandon, _) = watch::channel(false);
        Self {
            stats: ExportStats::new(),
            abandon,
        }
    }

    fn abandon(&self) {
        self.abandon.send_replace(true);
    }

    async fn abandoned(&self) {
        let mut rx = self.abandon.subscribe();
        // The sender outlives every branch, so this only returns once set
        let _ = rx.wait_for(|abandoned| *abandoned).await;
    }

    /// Run a step that may be dropped once the export is abandoned.
    async fn unless_abandoned<T, F>(&self, step: F) -> Result<T, ExportError>
    where
        F: Future<Output = Result<T, ExportError>>,
    {
        tokio::select! {
            biased;
            () = self.abandoned() => Err(ExportError::Abandoned),
            result = step => result,
        }
    }
}

/// One unit of recursive work.
struct Branch {
    /// Source path used for resolution; below a followed symlink it names the
    /// target while the destination stays at the link
    path: String,
    parent: Arc<dyn DestDir>,
    name: String,
    link_depth: usize,
}

impl Branch {
    fn child(&self, name: String, dir: &Arc<dyn DestDir>) -> Branch {
        Branch {
            path: path::join(&self.path, &name),
            parent: Arc::clone(dir),
            name,
            link_depth: self.link_depth,
        }
    }

    /// Destination location; also the change-memory key
    fn location(&self) -> String {
        format!("{}/{}", self.parent.full_path(), self.name)
    }
}

/// Exports source subtrees onto a destination directory.
pub struct Exporter {
    resolver: Arc<dyn PathResolver>,
    memory: Arc<dyn ChangeMemory>,
    policy: FailurePolicy,
    max_symlink_depth: usize,
}

impl Exporter {
    pub fn new(resolver: Arc<dyn PathResolver>, memory: Arc<dyn ChangeMemory>) -> Self {
        Self {
            resolver,
            memory,
            policy: FailurePolicy::default(),
            max_symlink_depth: DEFAULT_MAX_SYMLINK_DEPTH,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_symlink_depth(mut self, depth: usize) -> Self {
        self.max_symlink_depth = depth;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn memory(&self) -> &Arc<dyn ChangeMemory> {
        &self.memory
    }

    /// Resolve `source` and export it as `name` under `dest`.
    #[instrument(skip(self, dest), fields(dest = %dest.full_path()))]
    pub async fn export_path(
        &self,
        source: &str,
        dest: Arc<dyn DestDir>,
        name: &str,
    ) -> Result<ExportReport, ExportError> {
        let resolved = self.resolve_required(source).await?;
        self.export(resolved.entry, source, dest, name).await
    }

    /// Export an already resolved entry found at `source`.
    ///
    /// The entry only selects the kind of export; trees, files and symlinks
    /// are re-resolved before use.
    pub async fn export(
        &self,
        entry: Entry,
        source: &str,
        dest: Arc<dyn DestDir>,
        name: &str,
    ) -> Result<ExportReport, ExportError> {
        let run = ExportRun::new();
        let branch = Branch {
            path: path::normalize_path_string(source),
            parent: dest,
            name: name.to_string(),
            link_depth: 0,
        };
        self.export_entry(entry, branch, &run).await?;
        let report = run.stats.finish();
        debug!(
            written = report.files_written,
            skipped = report.files_skipped,
            dangling = report.dangling_symlinks,
            "Export completed"
        );
        Ok(report)
    }

    fn export_entry<'a>(
        &'a self,
        entry: Entry,
        branch: Branch,
        run: &'a ExportRun,
    ) -> BoxFuture<'a, Result<(), ExportError>> {
        async move {
            match entry.mode {
                EntryMode::Symlink => self.export_symlink(branch, run).await,
                EntryMode::Tree | EntryMode::Commit => self.export_tree(branch, run).await,
                EntryMode::File | EntryMode::ExecutableFile => {
                    let key = branch.location();
                    if self.memory.get(&key) == Some(entry.hash) {
                        trace!(location = %key, hash = %short_hex(&entry.hash), "Skipping unchanged file");
                        run.stats.skipped();
                        // Completion is never synchronous, even with nothing to write
                        tokio::task::yield_now().await;
                        return Ok(());
                    }
                    let written = self.export_file(branch, run).await?;
                    // Remember only once the write and truncate both succeeded
                    self.memory.set(&key, written);
                    Ok(())
                }
            }
        }
        .boxed()
    }

    async fn export_tree(&self, branch: Branch, run: &ExportRun) -> Result<(), ExportError> {
        debug!(path = %branch.path, "Exporting tree");
        let resolved = run
            .unless_abandoned(self.resolve_required(&branch.path))
            .await?;
        let children = match resolved.content {
            Content::Tree(children) => children,
            _ => return Err(unexpected(&branch.path, "tree", resolved.entry.mode)),
        };

        let dir = branch
            .parent
            .get_directory(&branch.name)
            .await
            .map_err(|e| ExportError::destination(&branch.location(), e))?;
        run.stats.directory();

        let mut pending: FuturesUnordered<_> = children
            .into_iter()
            .map(|(name, child)| {
                let child_branch = branch.child(name, &dir);
                match child.entry() {
                    Ok(entry) => self.export_entry(entry, child_branch, run),
                    Err(e) => futures::future::ready(Err::<(), _>(ExportError::from(e))).boxed(),
                }
            })
            .collect();

        let mut first_error = None;
        let mut abandoned = false;
        while let Some(outcome) = pending.next().await {
            let Err(err) = outcome else {
                continue;
            };
            if matches!(err, ExportError::Abandoned) {
                abandoned = true;
                continue;
            }
            if first_error.is_some() {
                trace!(path = %branch.path, error = %err, "Discarding later sibling failure");
                continue;
            }
            if self.policy == FailurePolicy::FailFast {
                debug!(
                    path = %branch.path,
                    remaining = pending.len(),
                    "Abandoning pending exports after failure"
                );
                run.abandon();
            }
            first_error = Some(err);
        }

        match first_error {
            Some(err) => Err(err),
            None if abandoned => Err(ExportError::Abandoned),
            None => Ok(()),
        }
    }

    /// Export a symlink as a copy of whatever it points at, under the link's
    /// own name. A target that does not exist is skipped, not an error.
    async fn export_symlink(&self, branch: Branch, run: &ExportRun) -> Result<(), ExportError> {
        debug!(path = %branch.path, "Exporting symlink");
        let resolved = run
            .unless_abandoned(self.resolve_required(&branch.path))
            .await?;
        let link = match &resolved.content {
            Content::Link(text) => text.trim().to_string(),
            _ => return Err(unexpected(&branch.path, "symlink", resolved.entry.mode)),
        };

        let link_depth = branch.link_depth + 1;
        if link_depth > self.max_symlink_depth {
            return Err(ExportError::SymlinkLoop {
                path: branch.path,
                limit: self.max_symlink_depth,
            });
        }

        let target_path = path::join_all(&[branch.path.as_str(), "..", link.as_str()]);
        let target = run
            .unless_abandoned(async {
                self.resolver
                    .resolve(&target_path)
                    .await
                    .map_err(ExportError::from)
            })
            .await?;
        match target {
            None => {
                warn!(path = %branch.path, target = %target_path, "Dangling symlink");
                run.stats.dangling();
                Ok(())
            }
            Some(target) => {
                trace!(path = %branch.path, target = %target_path, "Following symlink");
                let follow = Branch {
                    path: target_path,
                    parent: branch.parent,
                    name: branch.name,
                    link_depth,
                };
                self.export_entry(target.entry, follow, run).await
            }
        }
    }

    /// resolving -> loading-blob -> opening-file -> writing -> truncating.
    /// Returns the hash of the content actually written.
    ///
    /// Abandonment can stop the first two stages only; once the destination
    /// file is opened the write always runs through truncation.
    async fn export_file(&self, branch: Branch, run: &ExportRun) -> Result<Hash, ExportError> {
        debug!(path = %branch.path, "Exporting file");
        let (hash, blob) = run
            .unless_abandoned(async {
                let resolved = self.resolve_required(&branch.path).await?;
                if !resolved.entry.mode.is_file() {
                    return Err(unexpected(&branch.path, "file", resolved.entry.mode));
                }
                let blob = resolved.store.load_blob(&resolved.entry.hash).await?;
                Ok((resolved.entry.hash, blob))
            })
            .await?;

        let location = branch.location();
        let file = branch
            .parent
            .get_file(&branch.name)
            .await
            .map_err(|e| ExportError::write_failed(&location, FileStage::OpeningFile, e))?;
        let mut writer = file
            .create_writer()
            .await
            .map_err(|e| ExportError::write_failed(&location, FileStage::OpeningFile, e))?;

        let position = writer
            .write(&blob)
            .await
            .map_err(|e| ExportError::write_failed(&location, FileStage::Writing, e))?;
        // The file may be reused in place with a longer previous body
        writer
            .truncate(position)
            .await
            .map_err(|e| ExportError::write_failed(&location, FileStage::Truncating, e))?;

        run.stats.written(position);
        Ok(hash)
    }

    async fn resolve_required(&self, path: &str) -> Result<Resolved, ExportError> {
        self.resolver
            .resolve(path)
            .await?
            .ok_or_else(|| ExportError::SourceNotFound(path.to_string()))
    }
}

fn unexpected(path: &str, expected: &'static str, found: EntryMode) -> ExportError {
    ExportError::UnexpectedEntry {
        path: path.to_string(),
        expected,
        found,
    }
}
