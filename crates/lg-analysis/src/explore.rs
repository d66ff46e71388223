//! Node detail view for `exploreTable`

use crate::error::{AnalysisError, AnalysisResult};
use lg_core::{Direction, EdgeType, LineageGraph, LineageNode, NodeType, StatementRecord};
use serde::Serialize;

/// A neighbor of the explored node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborSummary {
    pub node_id: String,
    pub name: String,
    pub node_type: NodeType,
    pub edge_type: EdgeType,
    /// Number of edges (statements) linking the two nodes
    pub edge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_type: Option<String>,
}

/// A column of the explored node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub name: String,
    pub upstream_count: usize,
    pub downstream_count: usize,
}

/// Everything the detail panel shows for one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetail {
    pub node: LineageNode,
    pub columns: Vec<ColumnSummary>,
    pub upstream: Vec<NeighborSummary>,
    pub downstream: Vec<NeighborSummary>,
    /// Statements that write or read this node
    pub statements: Vec<StatementRecord>,
}

/// Resolve a table name (or explicit node id) and describe it.
///
/// An existing `node_id` wins; otherwise the name is looked up as a table
/// (or external), then a view, then a CTE.
pub fn explore_table(
    graph: &LineageGraph,
    table_name: &str,
    node_id: Option<&str>,
) -> AnalysisResult<TableDetail> {
    let node = node_id
        .and_then(|id| graph.node(id))
        .filter(|n| n.node_type.is_structural())
        .or_else(|| {
            [NodeType::Table, NodeType::View, NodeType::Cte]
                .iter()
                .find_map(|t| graph.find_node(*t, table_name))
        })
        .ok_or_else(|| AnalysisError::EntityNotFound {
            entity_type: "table".to_string(),
            name: node_id.unwrap_or(table_name).to_string(),
        })?;

    let columns = graph
        .columns_of(&node.id)
        .into_iter()
        .map(|c| ColumnSummary {
            name: c.name.clone(),
            upstream_count: graph
                .column_edges_into(&node.id, &c.name)
                .iter()
                .filter(|e| !e.is_terminal())
                .count(),
            downstream_count: graph
                .column_edges_from(&node.id, &c.name)
                .iter()
                .filter(|e| !e.is_terminal())
                .count(),
        })
        .collect();

    let statements = graph
        .statements()
        .iter()
        .filter(|s| s.target.as_deref() == Some(node.id.as_str()) || s.reads.contains(&node.id))
        .cloned()
        .collect();

    Ok(TableDetail {
        node: node.clone(),
        columns,
        upstream: neighbors(graph, &node.id, Direction::Upstream),
        downstream: neighbors(graph, &node.id, Direction::Downstream),
        statements,
    })
}

/// One summary per distinct neighbor, in edge order
fn neighbors(graph: &LineageGraph, id: &str, direction: Direction) -> Vec<NeighborSummary> {
    let mut out: Vec<NeighborSummary> = Vec::new();
    for edge in graph.edges_directed(id, direction) {
        let other = match direction {
            Direction::Upstream => &edge.source_id,
            Direction::Downstream => &edge.target_id,
        };
        if let Some(existing) = out.iter_mut().find(|n| &n.node_id == other) {
            existing.edge_count += 1;
            if edge.edge_type == EdgeType::Direct {
                existing.edge_type = EdgeType::Direct;
            }
            if existing.join_type.is_none() {
                existing.join_type = edge.metadata.join_type.map(|j| j.to_string());
            }
            continue;
        }
        let Some(node) = graph.node(other) else {
            continue;
        };
        out.push(NeighborSummary {
            node_id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
            edge_type: edge.edge_type,
            edge_count: 1,
            join_type: edge.metadata.join_type.map(|j| j.to_string()),
        });
    }
    out
}

#[cfg(test)]
#[path = "explore_test.rs"]
mod tests;
