//! Immutable lineage graph snapshot and its query methods

use crate::model::{
    ColumnEdge, Diagnostic, Direction, LineageEdge, LineageNode, NodeMetadata, NodeType,
    StatementRecord,
};
use chrono::{DateTime, Utc};
use lg_sql::last_segment;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Node/edge counts of a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub tables: usize,
    pub views: usize,
    pub ctes: usize,
    pub externals: usize,
    pub columns: usize,
    pub edges: usize,
    pub column_edges: usize,
    pub statements: usize,
    pub files: usize,
    pub diagnostics: usize,
}

/// One built lineage graph.
///
/// Structural nodes live in a petgraph `DiGraph` whose edges point from a
/// source to its dependent; each graph edge carries the index of its
/// [`LineageEdge`]. Column edges are indexed separately by column id.
#[derive(Debug, Clone)]
pub struct LineageGraph {
    graph: DiGraph<String, usize>,
    node_map: HashMap<String, NodeIndex>,
    nodes: BTreeMap<String, LineageNode>,
    edges: Vec<LineageEdge>,
    column_edges: Vec<ColumnEdge>,
    column_in: HashMap<String, Vec<usize>>,
    column_out: HashMap<String, Vec<usize>>,
    statements: Vec<StatementRecord>,
    diagnostics: Vec<Diagnostic>,
    files: BTreeSet<String>,
    built_at: DateTime<Utc>,
}

impl LineageGraph {
    /// Create an empty graph
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    /// Assemble a graph from its parts.
    ///
    /// Edge endpoints without a node are materialized as `external` nodes
    /// and every column edge endpoint gets a column node, so no id in the
    /// snapshot dangles.
    pub fn from_parts(
        nodes: Vec<LineageNode>,
        edges: Vec<LineageEdge>,
        column_edges: Vec<ColumnEdge>,
        statements: Vec<StatementRecord>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut node_table: BTreeMap<String, LineageNode> = BTreeMap::new();
        for node in nodes {
            node_table.entry(node.id.clone()).or_insert(node);
        }

        for edge in &edges {
            for id in [&edge.source_id, &edge.target_id] {
                if !node_table.contains_key(id) {
                    let node = synthesize_external(id);
                    log::debug!("Synthesized {} for dangling edge endpoint {}", node.id, id);
                    node_table.insert(id.clone(), node);
                }
            }
        }

        for ce in &column_edges {
            for (owner, column) in [
                (&ce.source_node_id, &ce.source_column),
                (&ce.target_node_id, &ce.target_column),
            ] {
                if !node_table.contains_key(owner) {
                    node_table.insert(owner.clone(), synthesize_external(owner));
                }
                let column_node = LineageNode::column(owner, column);
                node_table.entry(column_node.id.clone()).or_insert(column_node);
            }
        }

        // Column nodes for every known column of every structural node
        let known: Vec<(String, Vec<String>)> = node_table
            .values()
            .filter(|n| n.node_type.is_structural())
            .map(|n| (n.id.clone(), n.metadata.columns.clone()))
            .collect();
        for (owner, columns) in known {
            for column in columns {
                let column_node = LineageNode::column(&owner, &column);
                node_table.entry(column_node.id.clone()).or_insert(column_node);
            }
        }

        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        for node in node_table.values() {
            if node.node_type.is_structural() {
                let idx = graph.add_node(node.id.clone());
                node_map.insert(node.id.clone(), idx);
            }
        }
        for (i, edge) in edges.iter().enumerate() {
            if let (Some(&s), Some(&t)) =
                (node_map.get(&edge.source_id), node_map.get(&edge.target_id))
            {
                graph.add_edge(s, t, i);
            }
        }

        let mut column_in: HashMap<String, Vec<usize>> = HashMap::new();
        let mut column_out: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, ce) in column_edges.iter().enumerate() {
            column_in.entry(ce.target_column_id()).or_default().push(i);
            column_out.entry(ce.source_column_id()).or_default().push(i);
        }

        let mut files: BTreeSet<String> = statements.iter().map(|s| s.file_path.clone()).collect();
        files.extend(diagnostics.iter().map(|d| d.file_path.clone()));

        Self {
            graph,
            node_map,
            nodes: node_table,
            edges,
            column_edges,
            column_in,
            column_out,
            statements,
            diagnostics,
            files,
            built_at: Utc::now(),
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.get(id)
    }

    /// Check if a node exists
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id
    pub fn nodes(&self) -> impl Iterator<Item = &LineageNode> {
        self.nodes.values()
    }

    /// Structural (non-column) nodes, ordered by id
    pub fn structural_nodes(&self) -> impl Iterator<Item = &LineageNode> {
        self.nodes.values().filter(|n| n.node_type.is_structural())
    }

    pub fn edges(&self) -> &[LineageEdge] {
        &self.edges
    }

    pub fn column_edges(&self) -> &[ColumnEdge] {
        &self.column_edges
    }

    pub fn statements(&self) -> &[StatementRecord] {
        &self.statements
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Indexed files (including ones that failed to parse)
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Structural edges touching `id` in `direction`, ordered by edge index.
    ///
    /// Upstream yields edges whose target is `id`; downstream yields edges
    /// whose source is `id`.
    pub fn edges_directed(&self, id: &str, direction: Direction) -> Vec<&LineageEdge> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut indices: Vec<usize> = self
            .graph
            .edges_directed(idx, direction.petgraph())
            .map(|e| *e.weight())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.edges[i]).collect()
    }

    /// Distinct neighbor ids of `id` in `direction`, in edge order
    pub fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.edges_directed(id, direction)
            .into_iter()
            .map(|e| match direction {
                Direction::Upstream => e.source_id.as_str(),
                Direction::Downstream => e.target_id.as_str(),
            })
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Column edges arriving at `(node_id, column)`
    pub fn column_edges_into(&self, node_id: &str, column: &str) -> Vec<&ColumnEdge> {
        self.column_edges_at(&self.column_in, node_id, column)
    }

    /// Column edges leaving `(node_id, column)`
    pub fn column_edges_from(&self, node_id: &str, column: &str) -> Vec<&ColumnEdge> {
        self.column_edges_at(&self.column_out, node_id, column)
    }

    fn column_edges_at(
        &self,
        index: &HashMap<String, Vec<usize>>,
        node_id: &str,
        column: &str,
    ) -> Vec<&ColumnEdge> {
        let key = crate::model::column_node_id(node_id, column);
        index
            .get(&key)
            .map(|ids| ids.iter().map(|&i| &self.column_edges[i]).collect())
            .unwrap_or_default()
    }

    /// Whether a column of a node is known to the graph
    pub fn has_column(&self, node_id: &str, column: &str) -> bool {
        self.contains(&crate::model::column_node_id(node_id, column))
    }

    /// Column nodes owned by a structural node, ordered by id
    pub fn columns_of(&self, node_id: &str) -> Vec<&LineageNode> {
        self.nodes
            .values()
            .filter(|n| n.metadata.parent_id.as_deref() == Some(node_id))
            .collect()
    }

    /// Structural nodes defined (or written) in `file_path`
    pub fn nodes_in_file(&self, file_path: &str) -> Vec<&LineageNode> {
        self.structural_nodes()
            .filter(|n| n.metadata.defined_in.iter().any(|f| f == file_path))
            .collect()
    }

    /// Find a structural node by type and name.
    ///
    /// Tries the exact id first, then a unique match on the last name
    /// segment. Looking up a `table` also finds an `external` of that name.
    pub fn find_node(&self, node_type: NodeType, name: &str) -> Option<&LineageNode> {
        let types: &[NodeType] = match node_type {
            NodeType::Table => &[NodeType::Table, NodeType::External],
            NodeType::View => &[NodeType::View],
            NodeType::Cte => &[NodeType::Cte],
            NodeType::External => &[NodeType::External],
            NodeType::Column => return None,
        };
        let name = name.trim().to_lowercase();

        for t in types {
            if let Some(node) = self.node(&crate::model::node_id(*t, &name)) {
                return Some(node);
            }
        }

        let wanted = last_segment(&name);
        let mut matches = self
            .structural_nodes()
            .filter(|n| types.contains(&n.node_type) && last_segment(&n.name) == wanted);
        match (matches.next(), matches.next()) {
            (Some(node), None) => Some(node),
            _ => None,
        }
    }

    /// Statements that read any of the given nodes
    pub fn statements_reading<'a>(
        &'a self,
        ids: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a StatementRecord> + 'a {
        self.statements
            .iter()
            .filter(move |s| s.reads.iter().any(|r| ids.contains(r)))
    }

    /// Summary counts
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            edges: self.edges.len(),
            column_edges: self.column_edges.len(),
            statements: self.statements.len(),
            files: self.files.len(),
            diagnostics: self.diagnostics.len(),
            ..GraphStats::default()
        };
        for node in self.nodes.values() {
            match node.node_type {
                NodeType::Table => stats.tables += 1,
                NodeType::View => stats.views += 1,
                NodeType::Cte => stats.ctes += 1,
                NodeType::External => stats.externals += 1,
                NodeType::Column => stats.columns += 1,
            }
        }
        stats
    }
}

impl Default for LineageGraph {
    fn default() -> Self {
        Self::empty()
    }
}

/// External node standing in for an id nothing defines
fn synthesize_external(id: &str) -> LineageNode {
    let name = crate::model::split_node_id(id)
        .map(|(_, name)| name)
        .unwrap_or(id);
    LineageNode {
        id: id.to_string(),
        node_type: NodeType::External,
        name: name.to_string(),
        metadata: NodeMetadata::default(),
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
