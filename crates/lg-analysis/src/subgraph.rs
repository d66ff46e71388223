//! Reachable subgraph for rendering (`getLineageGraph`)

use crate::error::{AnalysisError, AnalysisResult};
use crate::flow::{FlowAnalyzer, FlowTarget};
use lg_core::{ColumnEdge, Direction, LineageEdge, LineageGraph, LineageNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which way to expand from the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDirection {
    Upstream,
    Downstream,
    #[default]
    Both,
}

impl GraphDirection {
    fn directions(&self) -> &'static [Direction] {
        match self {
            GraphDirection::Upstream => &[Direction::Upstream],
            GraphDirection::Downstream => &[Direction::Downstream],
            GraphDirection::Both => &[Direction::Upstream, Direction::Downstream],
        }
    }
}

/// Nodes and edges around a root node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageSubgraph {
    pub root_id: String,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
    pub column_edges: Vec<ColumnEdge>,
}

/// Collect the subgraph reachable from `root_id`.
///
/// Structural edges are kept when both ends are in the reachable set.
/// Column nodes and column edges are only included for nodes listed in
/// `expanded`, and only when the other end is reachable too.
pub fn lineage_subgraph(
    graph: &LineageGraph,
    root_id: &str,
    direction: GraphDirection,
    depth: usize,
    expanded: &[String],
) -> AnalysisResult<LineageSubgraph> {
    let root = graph.node(root_id).ok_or_else(|| AnalysisError::NodeNotFound {
        id: root_id.to_string(),
    })?;

    let flow = FlowAnalyzer::new(graph);
    let target = FlowTarget::Node(root.id.clone());
    let mut nodes = vec![root.clone()];
    let mut reachable: BTreeSet<&str> = BTreeSet::new();
    reachable.insert(root.id.as_str());
    for dir in direction.directions() {
        for node in flow.traverse(&target, *dir, depth).nodes {
            if let Some(node) = graph.node(&node.id) {
                if reachable.insert(node.id.as_str()) {
                    nodes.push(node.clone());
                }
            }
        }
    }

    let edges: Vec<LineageEdge> = graph
        .edges()
        .iter()
        .filter(|e| reachable.contains(e.source_id.as_str()) && reachable.contains(e.target_id.as_str()))
        .cloned()
        .collect();

    let expanded: BTreeSet<&str> = expanded
        .iter()
        .map(String::as_str)
        .filter(|id| reachable.contains(id))
        .collect();

    let mut column_edges = Vec::new();
    let mut column_ids: BTreeSet<String> = BTreeSet::new();
    for id in &expanded {
        for column in graph.columns_of(id) {
            column_ids.insert(column.id.clone());
        }
    }
    for edge in graph.column_edges() {
        let touches = expanded.contains(edge.source_node_id.as_str())
            || expanded.contains(edge.target_node_id.as_str());
        let inside = reachable.contains(edge.source_node_id.as_str())
            && reachable.contains(edge.target_node_id.as_str());
        if touches && inside {
            column_ids.insert(edge.source_column_id());
            column_ids.insert(edge.target_column_id());
            column_edges.push(edge.clone());
        }
    }
    nodes.extend(column_ids.iter().filter_map(|id| graph.node(id)).cloned());

    Ok(LineageSubgraph {
        root_id: root.id.clone(),
        nodes,
        edges,
        column_edges,
    })
}

#[cfg(test)]
#[path = "subgraph_test.rs"]
mod tests;
