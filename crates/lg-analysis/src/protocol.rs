//! JSON request/response protocol
//!
//! Requests are tagged by `command`:
//!
//! ```json
//! {"command": "getUpstream", "nodeId": "view:daily_orders", "depth": 3}
//! {"command": "getDownstream", "nodeId": {"nodeType": "file", "filePath": "orders.sql"}}
//! {"command": "getLineageGraph", "nodeId": "table:orders", "direction": "both", "expandedNodes": []}
//! {"command": "selectColumn", "tableId": "view:daily_orders", "columnName": "total_revenue"}
//! {"command": "analyzeImpact", "type": "table", "name": "orders", "changeType": "drop"}
//! {"command": "exploreTable", "tableName": "orders"}
//! ```
//!
//! Every request yields a response value; failures become `{"error": ...}`.

use crate::column::{ColumnLineage, ColumnLineageResolver};
use crate::depth::resolve_depth;
use crate::error::{AnalysisError, AnalysisResult};
use crate::explore::{explore_table, TableDetail};
use crate::flow::{FlowAnalyzer, FlowResult, FlowTarget};
use crate::impact::{ChangeType, ImpactAnalyzer, ImpactReport};
use crate::subgraph::{lineage_subgraph, GraphDirection, LineageSubgraph};
use lg_core::{Config, LineageGraph, NodeType, MAX_DEPTH};
use serde::{Deserialize, Serialize};

/// Node id, or a file selector
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NodeSelector {
    Id(String),
    #[serde(rename_all = "camelCase")]
    File { node_type: String, file_path: String },
}

/// Parameters of `getUpstream` / `getDownstream`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowParams {
    #[serde(default)]
    pub node_id: Option<NodeSelector>,
    /// `"file"` together with `filePath` selects a file
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub depth: Option<f64>,
}

impl FlowParams {
    pub fn target(&self) -> AnalysisResult<FlowTarget> {
        match &self.node_id {
            Some(NodeSelector::Id(id)) => return Ok(FlowTarget::Node(id.clone())),
            Some(NodeSelector::File {
                node_type,
                file_path,
            }) => return file_target(node_type, file_path),
            None => {}
        }
        match (&self.node_type, &self.file_path) {
            (Some(node_type), Some(file_path)) => file_target(node_type, file_path),
            _ => Err(AnalysisError::InvalidRequest {
                message: "expected 'nodeId' or a file selector".to_string(),
            }),
        }
    }
}

fn file_target(node_type: &str, file_path: &str) -> AnalysisResult<FlowTarget> {
    if node_type.eq_ignore_ascii_case("file") {
        Ok(FlowTarget::File(file_path.to_string()))
    } else {
        Err(AnalysisError::InvalidRequest {
            message: format!("unsupported selector nodeType '{node_type}'"),
        })
    }
}

/// Parameters of `getLineageGraph`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphParams {
    pub node_id: String,
    #[serde(default)]
    pub direction: GraphDirection,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub expanded_nodes: Vec<String>,
}

/// Parameters of `selectColumn`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectColumnParams {
    pub table_id: String,
    pub column_name: String,
}

/// Parameters of `analyzeImpact`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactParams {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    pub change_type: ChangeType,
}

/// Parameters of `exploreTable`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreParams {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub node_id: Option<String>,
}

/// A protocol request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Request {
    GetUpstream(FlowParams),
    GetDownstream(FlowParams),
    GetLineageGraph(GraphParams),
    SelectColumn(SelectColumnParams),
    AnalyzeImpact(ImpactParams),
    ExploreTable(ExploreParams),
}

impl Request {
    /// Parse one JSON request
    pub fn parse(raw: &str) -> AnalysisResult<Self> {
        serde_json::from_str(raw).map_err(|e| AnalysisError::InvalidRequest {
            message: e.to_string(),
        })
    }
}

/// A protocol response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Flow(FlowResult),
    Graph(LineageSubgraph),
    Column(ColumnLineage),
    Impact(Box<ImpactReport>),
    Table(Box<TableDetail>),
    Error { error: String },
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

impl From<AnalysisError> for Response {
    fn from(err: AnalysisError) -> Self {
        Response::Error {
            error: err.to_string(),
        }
    }
}

/// Answers requests against one snapshot
#[derive(Debug, Clone, Copy)]
pub struct LineageService<'a> {
    graph: &'a LineageGraph,
    config: &'a Config,
}

impl<'a> LineageService<'a> {
    pub fn new(graph: &'a LineageGraph, config: &'a Config) -> Self {
        Self { graph, config }
    }

    /// Handle a request; errors become `Response::Error`
    pub fn handle(&self, request: &Request) -> Response {
        match self.try_handle(request) {
            Ok(response) => response,
            Err(err) => {
                log::debug!("Request failed: {}", err);
                err.into()
            }
        }
    }

    /// Handle one raw JSON request and serialize the response
    pub fn handle_json(&self, raw: &str) -> String {
        let response = match Request::parse(raw) {
            Ok(request) => self.handle(&request),
            Err(err) => err.into(),
        };
        match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        }
    }

    pub fn try_handle(&self, request: &Request) -> AnalysisResult<Response> {
        let default_depth = self.config.traversal.default_depth;
        match request {
            Request::GetUpstream(params) => {
                let depth = resolve_depth(params.depth, default_depth);
                Ok(Response::Flow(
                    FlowAnalyzer::new(self.graph).upstream(&params.target()?, depth),
                ))
            }
            Request::GetDownstream(params) => {
                let depth = resolve_depth(params.depth, default_depth);
                Ok(Response::Flow(
                    FlowAnalyzer::new(self.graph).downstream(&params.target()?, depth),
                ))
            }
            Request::GetLineageGraph(params) => {
                let depth = resolve_depth(params.depth, default_depth);
                lineage_subgraph(
                    self.graph,
                    &params.node_id,
                    params.direction,
                    depth,
                    &params.expanded_nodes,
                )
                .map(Response::Graph)
            }
            Request::SelectColumn(params) => {
                if !self.graph.contains(&params.table_id) {
                    return Err(AnalysisError::NodeNotFound {
                        id: params.table_id.clone(),
                    });
                }
                let resolver = ColumnLineageResolver::new(self.graph)
                    .with_max_depth(MAX_DEPTH)
                    .with_max_paths(self.config.traversal.max_paths);
                Ok(Response::Column(
                    resolver.resolve(&params.table_id, &params.column_name),
                ))
            }
            Request::AnalyzeImpact(params) => {
                let entity_type = NodeType::from_name(&params.entity_type)
                    .filter(NodeType::is_structural)
                    .ok_or_else(|| AnalysisError::InvalidRequest {
                        message: format!("unsupported entity type '{}'", params.entity_type),
                    })?;
                let report = ImpactAnalyzer::new(self.graph, &self.config.impact, default_depth)
                    .analyze(entity_type, &params.name, params.change_type)?;
                Ok(Response::Impact(Box::new(report)))
            }
            Request::ExploreTable(params) => {
                if params.table_name.trim().is_empty() && params.node_id.is_none() {
                    return Err(AnalysisError::InvalidRequest {
                        message: "expected 'tableName' or 'nodeId'".to_string(),
                    });
                }
                explore_table(self.graph, &params.table_name, params.node_id.as_deref())
                    .map(|detail| Response::Table(Box::new(detail)))
            }
        }
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
