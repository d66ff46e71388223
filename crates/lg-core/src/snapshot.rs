//! Published graph snapshots and build generations
//!
//! Readers clone the current `Arc<LineageGraph>` and keep using it for as
//! long as they like; a rebuild swaps in a new `Arc` without touching the
//! old one. Every build carries a [`BuildToken`]; publishing with a token
//! older than the latest generation is refused.

use crate::graph::LineageGraph;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Generation stamp of one build
#[derive(Debug, Clone)]
pub struct BuildToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl BuildToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A newer build (or an explicit supersede) has started since this one
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }
}

/// Holder of the currently published snapshot
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Published>,
    latest: Arc<AtomicU64>,
}

#[derive(Debug)]
struct Published {
    graph: Arc<LineageGraph>,
    generation: u64,
}

impl SnapshotStore {
    /// Store publishing `graph` as generation 0
    pub fn new(graph: LineageGraph) -> Self {
        Self {
            current: RwLock::new(Published {
                graph: Arc::new(graph),
                generation: 0,
            }),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The published snapshot
    pub fn current(&self) -> Arc<LineageGraph> {
        match self.current.read() {
            Ok(published) => Arc::clone(&published.graph),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().graph),
        }
    }

    /// Generation of the published snapshot
    pub fn published_generation(&self) -> u64 {
        match self.current.read() {
            Ok(published) => published.generation,
            Err(poisoned) => poisoned.into_inner().generation,
        }
    }

    /// Start a build; any build started earlier is now superseded
    pub fn begin_build(&self) -> BuildToken {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        BuildToken {
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Invalidate every in-flight build without starting a new one
    pub fn supersede(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Publish a graph built under `token`.
    ///
    /// Returns `false` (and drops the graph) when the token was superseded.
    pub fn publish(&self, token: &BuildToken, graph: LineageGraph) -> bool {
        let mut published = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if token.is_superseded() || token.generation <= published.generation {
            log::debug!(
                "Discarding build {} (latest {})",
                token.generation,
                self.latest.load(Ordering::SeqCst)
            );
            return false;
        }
        published.graph = Arc::new(graph);
        published.generation = token.generation;
        true
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(LineageGraph::empty())
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
