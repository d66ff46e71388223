//! Lineage graph data model: nodes, edges, column edges and statement records

use lg_sql::{JoinKind, StatementKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a lineage node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Table,
    View,
    Cte,
    External,
    Column,
}

impl NodeType {
    /// Structural node types, in reporting order
    pub const STRUCTURAL: [NodeType; 4] = [
        NodeType::Table,
        NodeType::View,
        NodeType::Cte,
        NodeType::External,
    ];

    /// Id prefix and serialized name
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Table => "table",
            NodeType::View => "view",
            NodeType::Cte => "cte",
            NodeType::External => "external",
            NodeType::Column => "column",
        }
    }

    /// Parse a node type name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "table" => Some(NodeType::Table),
            "view" => Some(NodeType::View),
            "cte" => Some(NodeType::Cte),
            "external" => Some(NodeType::External),
            "column" => Some(NodeType::Column),
            _ => None,
        }
    }

    /// Whether this is a relation-level node (not a column)
    pub fn is_structural(&self) -> bool {
        !matches!(self, NodeType::Column)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable id of a structural node: `"<type>:<qualified_name>"`
pub fn node_id(node_type: NodeType, qualified_name: &str) -> String {
    format!("{}:{}", node_type.as_str(), qualified_name.to_lowercase())
}

/// Stable id of a CTE, scoped to the statement defining it:
/// `"cte:<file>#<statement_index>:<name>"`
pub fn cte_node_id(file_path: &str, statement_index: usize, name: &str) -> String {
    format!("cte:{}#{}:{}", file_path, statement_index, name.to_lowercase())
}

/// Stable id of a column node: `"column:<owner_id>.<column>"`
pub fn column_node_id(owner_id: &str, column: &str) -> String {
    format!("column:{}.{}", owner_id, column.to_lowercase())
}

/// Split a node id into its type and name part
pub fn split_node_id(id: &str) -> Option<(NodeType, &str)> {
    let (prefix, name) = id.split_once(':')?;
    Some((NodeType::from_name(prefix)?, name))
}

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards sources (what feeds this)
    Upstream,
    /// Towards consumers (what reads this)
    Downstream,
}

impl Direction {
    /// Matching petgraph edge direction (edges point source -> dependent)
    pub fn petgraph(&self) -> petgraph::Direction {
        match self {
            Direction::Upstream => petgraph::Direction::Incoming,
            Direction::Downstream => petgraph::Direction::Outgoing,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upstream => write!(f, "upstream"),
            Direction::Downstream => write!(f, "downstream"),
        }
    }
}

/// Node metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// First file defining this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Every file defining (or writing) this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defined_in: Vec<String>,

    /// Known output columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    /// Owning structural node (column nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Materialized view
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub materialized: bool,

    /// Listed in `external_tables`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub declared_external: bool,
}

/// A node of the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub metadata: NodeMetadata,
}

impl LineageNode {
    /// Structural node with the id derived from type and name
    pub fn new(node_type: NodeType, name: &str) -> Self {
        Self {
            id: node_id(node_type, name),
            node_type,
            name: name.to_lowercase(),
            metadata: NodeMetadata::default(),
        }
    }

    /// Column node owned by `owner_id`
    pub fn column(owner_id: &str, column: &str) -> Self {
        Self {
            id: column_node_id(owner_id, column),
            node_type: NodeType::Column,
            name: column.to_lowercase(),
            metadata: NodeMetadata {
                parent_id: Some(owner_id.to_string()),
                ..NodeMetadata::default()
            },
        }
    }
}

/// Structural edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Read through FROM/JOIN (or a write target's source)
    Direct,
    /// Read only inside an expression subquery or filter
    Derived,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeType::Direct => write!(f, "direct"),
            EdgeType::Derived => write!(f, "derived"),
        }
    }
}

/// Origin and join details of a structural edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    pub file_path: String,
    pub statement_index: usize,
    pub statement_kind: StatementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<JoinKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_condition: Option<String>,
}

/// "target depends on source"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub metadata: EdgeMetadata,
}

/// Stable edge id
pub fn edge_id(source_id: &str, target_id: &str, file_path: &str, statement_index: usize) -> String {
    format!("{source_id}->{target_id}@{file_path}#{statement_index}")
}

/// How a target column derives from a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformation {
    /// Terminal: the column originates here (literal or source-less)
    Source,
    Passthrough,
    Renamed,
    Aggregated,
    Calculated,
    Joined,
}

impl Transformation {
    /// Strength used when composing through derived tables
    pub fn rank(&self) -> u8 {
        match self {
            Transformation::Source => 0,
            Transformation::Passthrough => 1,
            Transformation::Joined => 2,
            Transformation::Renamed => 3,
            Transformation::Calculated => 4,
            Transformation::Aggregated => 5,
        }
    }

    /// Compose two hops into one label: the stronger one wins
    pub fn compose(self, other: Transformation) -> Transformation {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::Source => "source",
            Transformation::Passthrough => "passthrough",
            Transformation::Renamed => "renamed",
            Transformation::Aggregated => "aggregated",
            Transformation::Calculated => "calculated",
            Transformation::Joined => "joined",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column-level data flow between two structural nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEdge {
    pub source_node_id: String,
    pub source_column: String,
    pub target_node_id: String,
    pub target_column: String,
    pub transformation: Transformation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub file_path: String,
    pub statement_index: usize,
}

impl ColumnEdge {
    pub fn source_column_id(&self) -> String {
        column_node_id(&self.source_node_id, &self.source_column)
    }

    pub fn target_column_id(&self) -> String {
        column_node_id(&self.target_node_id, &self.target_column)
    }

    /// `source` marker edges point at their own target column
    pub fn is_terminal(&self) -> bool {
        self.transformation == Transformation::Source
    }
}

/// One indexed statement and the relations it touches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    pub file_path: String,
    pub index: usize,
    pub kind: StatementKind,
    /// Node written or defined by the statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Nodes read anywhere in the statement (CTEs included)
    pub reads: Vec<String>,
}


/// Per-file problem found while indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub file_path: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{}:{}:{}: {}", self.file_path, line, column, self.message)
            }
            _ => write!(f, "{}: {}", self.file_path, self.message),
        }
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
