//! lg-core - Core library for lineagegraph
//!
//! This crate provides configuration, workspace discovery, the lineage graph
//! model, the graph builder, and the snapshot store that readers query while
//! rebuilds run in the background.

pub mod builder;
pub mod checksum;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod rebuild;
pub mod snapshot;
pub mod workspace;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use builder::{BuildInput, FileUnit, GraphBuilder};
pub use checksum::compute_checksum;
pub use config::{
    ChangeFactors, Config, ImpactConfig, ImpactWeights, RebuildConfig, SeverityThresholds,
    TraversalConfig, MAX_DEPTH,
};
pub use error::{CoreError, CoreResult};
pub use graph::{GraphStats, LineageGraph};
pub use model::{
    column_node_id, cte_node_id, edge_id, node_id, split_node_id, ColumnEdge, Diagnostic, Direction,
    EdgeMetadata, EdgeType, LineageEdge, LineageNode, NodeMetadata, NodeType, StatementRecord,
    Transformation,
};
pub use rebuild::{FileChange, FileEvent, RebuildScheduler};
pub use snapshot::{BuildToken, SnapshotStore};
pub use workspace::Workspace;
