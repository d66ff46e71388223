//! Debounced, cancellable rebuilds driven by file-change events

use crate::builder::GraphBuilder;
use crate::snapshot::SnapshotStore;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    Changed,
    Removed,
}

/// A file-change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub path: PathBuf,
    pub change: FileChange,
}

impl FileEvent {
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            change: FileChange::Changed,
        }
    }

    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            change: FileChange::Removed,
        }
    }
}

/// Applies file events to a builder and publishes new snapshots.
///
/// Bursts of events coalesce into one rebuild after `debounce` of quiet.
/// An event arriving while a build runs supersedes that build; its result
/// is never published.
pub struct RebuildScheduler {
    workspace: Workspace,
    builder: GraphBuilder,
    store: Arc<SnapshotStore>,
    debounce: Duration,
}

impl RebuildScheduler {
    pub fn new(workspace: Workspace, builder: GraphBuilder, store: Arc<SnapshotStore>) -> Self {
        let debounce = Duration::from_millis(workspace.config.rebuild.debounce_ms);
        Self {
            workspace,
            builder,
            store,
            debounce,
        }
    }

    /// Override the quiet window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Process events until the sender side closes
    pub async fn run(mut self, mut events: mpsc::Receiver<FileEvent>) {
        let mut pending: Vec<FileEvent> = Vec::new();
        let mut closed = false;

        loop {
            if pending.is_empty() {
                match events.recv().await {
                    Some(event) => pending.push(event),
                    None => break,
                }
            }

            while !closed {
                match tokio::time::timeout(self.debounce, events.recv()).await {
                    Ok(Some(event)) => pending.push(event),
                    Ok(None) => closed = true,
                    Err(_) => break,
                }
            }

            let count = pending.len();
            if !self.apply(pending.drain(..)) {
                log::debug!("{} event(s) changed nothing, skipping rebuild", count);
                if closed {
                    break;
                }
                continue;
            }

            let token = self.store.begin_build();
            let input = self.builder.input();
            let build_token = token.clone();
            let mut build = tokio::task::spawn_blocking(move || {
                input.build_cancellable(|| build_token.is_superseded())
            });

            if closed {
                if let Ok(Some(graph)) = build.await {
                    self.publish(&token, graph);
                }
                break;
            }

            tokio::select! {
                result = &mut build => match result {
                    Ok(Some(graph)) => self.publish(&token, graph),
                    Ok(None) => log::debug!("Build {} cancelled", token.generation()),
                    Err(e) => log::warn!("Rebuild task failed: {}", e),
                },
                next = events.recv() => match next {
                    Some(event) => {
                        self.store.supersede();
                        log::debug!("Build {} superseded by {}", token.generation(), event.path.display());
                        pending.push(event);
                    }
                    None => {
                        if let Ok(Some(graph)) = build.await {
                            self.publish(&token, graph);
                        }
                        break;
                    }
                },
            }
        }
    }

    fn publish(&self, token: &crate::snapshot::BuildToken, graph: crate::graph::LineageGraph) {
        let stats = graph.stats();
        if self.store.publish(token, graph) {
            log::info!(
                "Published lineage snapshot {} ({} nodes, {} edges, {} diagnostics)",
                token.generation(),
                stats.tables + stats.views + stats.ctes + stats.externals,
                stats.edges,
                stats.diagnostics
            );
        }
    }

    /// Apply events to the builder; `true` when anything changed
    fn apply(&mut self, events: impl Iterator<Item = FileEvent>) -> bool {
        let mut changed = false;
        for event in events {
            let path = self.workspace.absolute_path(&event.path.to_string_lossy());
            match event.change {
                FileChange::Changed if self.workspace.is_indexed(&path) => {
                    changed |= self.workspace.load_file(&mut self.builder, &path);
                }
                FileChange::Changed => {
                    log::debug!("Ignoring change to {}", path.display());
                }
                FileChange::Removed => {
                    let key = self.workspace.relative_path(&path);
                    changed |= self.builder.remove_file(&key);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod tests;
