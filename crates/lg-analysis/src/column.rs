//! Column-level lineage tracing
//!
//! Walks column edges from one `(node, column)` pair. Every distinct chain
//! of contributing columns becomes its own path, so a calculated column fed
//! by two inputs yields two upstream paths.

use crate::flow::{LineagePath, PathStep};
use lg_core::{ColumnEdge, Direction, LineageGraph, MAX_DEPTH};
use serde::Serialize;

/// Lineage of one column in both directions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLineage {
    pub table_id: String,
    pub column_name: String,
    pub upstream: Vec<LineagePath>,
    pub downstream: Vec<LineagePath>,

    /// Set when there is nothing to trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ColumnLineage {
    fn unavailable(table_id: &str, column: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            column_name: column.to_string(),
            upstream: Vec::new(),
            downstream: Vec::new(),
            message: Some(format!("No lineage available for {table_id}.{column}")),
        }
    }

    /// Whether the column was found on its node
    pub fn is_available(&self) -> bool {
        self.message.is_none()
    }
}

struct Frame {
    node_id: String,
    column: String,
    steps: Vec<PathStep>,
    visited: Vec<String>,
}

/// Explicit-stack DFS over column edges
#[derive(Debug, Clone, Copy)]
pub struct ColumnLineageResolver<'g> {
    graph: &'g LineageGraph,
    max_depth: usize,
    max_paths: usize,
}

impl<'g> ColumnLineageResolver<'g> {
    pub fn new(graph: &'g LineageGraph) -> Self {
        Self {
            graph,
            max_depth: MAX_DEPTH,
            max_paths: 256,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.clamp(1, MAX_DEPTH);
        self
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths.max(1);
        self
    }

    /// Trace `column` of `node_id` upstream and downstream
    pub fn resolve(&self, node_id: &str, column: &str) -> ColumnLineage {
        let column = column.trim().to_lowercase();
        if !self.graph.has_column(node_id, &column) {
            log::debug!("No column {}.{} in the current snapshot", node_id, column);
            return ColumnLineage::unavailable(node_id, &column);
        }
        ColumnLineage {
            table_id: node_id.to_string(),
            column_name: column.clone(),
            upstream: self.trace(node_id, &column, Direction::Upstream),
            downstream: self.trace(node_id, &column, Direction::Downstream),
            message: None,
        }
    }

    /// Every chain leaving `(node_id, column)` in `direction`.
    ///
    /// Upstream chains end at `source` markers (included as a final step),
    /// at columns nothing feeds, or at `max_depth`. Downstream chains end at
    /// columns nothing reads. Columns already on a chain are not revisited.
    pub fn trace(&self, node_id: &str, column: &str, direction: Direction) -> Vec<LineagePath> {
        let mut seed = PathStep::for_id(self.graph, node_id);
        seed.column_name = Some(column.to_string());

        let mut paths = Vec::new();
        let mut stack = vec![Frame {
            node_id: node_id.to_string(),
            column: column.to_string(),
            steps: vec![seed],
            visited: vec![lg_core::column_node_id(node_id, column)],
        }];

        while let Some(frame) = stack.pop() {
            if paths.len() >= self.max_paths {
                log::debug!(
                    "Column lineage for {}.{} truncated at {} paths",
                    node_id,
                    column,
                    self.max_paths
                );
                break;
            }

            let depth = frame.steps.len() - 1;
            let edges = self.edges(&frame.node_id, &frame.column, direction);
            if depth >= self.max_depth || edges.is_empty() {
                if depth > 0 {
                    paths.push(LineagePath(frame.steps));
                }
                continue;
            }

            let mut continuations = Vec::new();
            let mut terminated = false;
            for edge in edges {
                if edge.is_terminal() {
                    let mut steps = frame.steps.clone();
                    steps.push(step_for(self.graph, edge, &edge.target_node_id, &edge.target_column));
                    paths.push(LineagePath(steps));
                    terminated = true;
                    continue;
                }

                let (next_node, next_column) = match direction {
                    Direction::Upstream => (&edge.source_node_id, &edge.source_column),
                    Direction::Downstream => (&edge.target_node_id, &edge.target_column),
                };
                let next_id = lg_core::column_node_id(next_node, next_column);
                if frame.visited.contains(&next_id) {
                    continue;
                }

                let mut steps = frame.steps.clone();
                steps.push(step_for(self.graph, edge, next_node, next_column));
                let mut visited = frame.visited.clone();
                visited.push(next_id);
                continuations.push(Frame {
                    node_id: next_node.clone(),
                    column: next_column.clone(),
                    steps,
                    visited,
                });
            }

            if continuations.is_empty() {
                if !terminated && depth > 0 {
                    paths.push(LineagePath(frame.steps));
                }
                continue;
            }
            // Reverse so the first edge is explored first
            stack.extend(continuations.into_iter().rev());
        }

        paths.truncate(self.max_paths);
        paths
    }

    fn edges(&self, node_id: &str, column: &str, direction: Direction) -> Vec<&'g ColumnEdge> {
        match direction {
            Direction::Upstream => self.graph.column_edges_into(node_id, column),
            Direction::Downstream => self
                .graph
                .column_edges_from(node_id, column)
                .into_iter()
                .filter(|e| !e.is_terminal())
                .collect(),
        }
    }
}

fn step_for(graph: &LineageGraph, edge: &ColumnEdge, node_id: &str, column: &str) -> PathStep {
    let mut step = PathStep::for_id(graph, node_id);
    step.column_name = Some(column.to_string());
    step.transformation = Some(edge.transformation);
    step.expression = edge.expression.clone();
    step
}

#[cfg(test)]
#[path = "column_test.rs"]
mod tests;
