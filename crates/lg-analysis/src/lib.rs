//! lg-analysis: queries over a lineage graph snapshot
//!
//! Directional flow (upstream/downstream), column lineage, change impact,
//! node exploration and subgraph extraction, plus the JSON request/response
//! protocol that exposes them. Every query is a pure function of one
//! `LineageGraph`.

pub mod column;
pub mod depth;
pub mod error;
pub mod explore;
pub mod flow;
pub mod impact;
pub mod protocol;
pub mod subgraph;

pub use column::{ColumnLineage, ColumnLineageResolver};
pub use depth::{normalize_depth, resolve_depth};
pub use error::{AnalysisError, AnalysisResult};
pub use explore::{explore_table, ColumnSummary, NeighborSummary, TableDetail};
pub use flow::{FlowAnalyzer, FlowResult, FlowTarget, LineagePath, PathStep};
pub use impact::{
    ChangeType, ImpactAnalyzer, ImpactLevel, ImpactReport, ImpactSummary, ImpactedEntity,
    Severity,
};
pub use protocol::{
    ExploreParams, FlowParams, GraphParams, ImpactParams, LineageService, NodeSelector, Request,
    Response, SelectColumnParams,
};
pub use subgraph::{lineage_subgraph, GraphDirection, LineageSubgraph};
