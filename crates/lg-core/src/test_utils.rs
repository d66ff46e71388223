//! Shared test fixtures for lineage graphs.
//!
//! Available to this crate's tests and, behind the `test-support` feature,
//! to downstream crates.

use crate::builder::GraphBuilder;
use crate::graph::LineageGraph;
use crate::model::{
    edge_id, ColumnEdge, EdgeMetadata, EdgeType, LineageEdge, LineageNode, NodeType,
    StatementRecord, Transformation,
};
use lg_sql::{SqlDialect, StatementKind};

/// DDL for the canonical orders -> daily_orders scenario
pub const ORDERS_DDL: &str = "CREATE TABLE orders (id INTEGER, customer_id INTEGER, order_date DATE, total DECIMAL(10, 2));";

/// View over `orders` aggregating `total`
pub const DAILY_ORDERS_VIEW: &str = "CREATE VIEW daily_orders AS
SELECT order_date, SUM(total) AS total_revenue
FROM orders
GROUP BY order_date;";

/// Build a graph from `(path, sql)` pairs with the default dialect
pub fn build_graph(files: &[(&str, &str)]) -> LineageGraph {
    builder_with(files).build()
}

/// A builder pre-loaded with `(path, sql)` pairs
pub fn builder_with(files: &[(&str, &str)]) -> GraphBuilder {
    let mut builder = GraphBuilder::new(SqlDialect::DuckDb);
    for (path, sql) in files {
        builder.set_file(path, sql);
    }
    builder
}

/// `table:orders -> view:daily_orders` with an aggregated column edge
pub fn orders_scenario() -> LineageGraph {
    build_graph(&[("orders.sql", ORDERS_DDL), ("daily_orders.sql", DAILY_ORDERS_VIEW)])
}

/// Hand-assembled graph for traversal tests that don't need SQL
#[derive(Debug, Default)]
pub struct GraphFixture {
    nodes: Vec<LineageNode>,
    edges: Vec<LineageEdge>,
    column_edges: Vec<ColumnEdge>,
    statements: Vec<StatementRecord>,
}

impl GraphFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a structural node defined in `<name>.sql`
    pub fn node(mut self, node_type: NodeType, name: &str) -> Self {
        let mut node = LineageNode::new(node_type, name);
        let file = format!("{name}.sql");
        node.metadata.file_path = Some(file.clone());
        node.metadata.defined_in = vec![file];
        self.nodes.push(node);
        self
    }

    /// Add a direct edge between two node ids
    pub fn edge(self, source_id: &str, target_id: &str) -> Self {
        self.typed_edge(source_id, target_id, EdgeType::Direct)
    }

    pub fn typed_edge(mut self, source_id: &str, target_id: &str, edge_type: EdgeType) -> Self {
        let index = self.edges.len();
        self.edges.push(LineageEdge {
            id: edge_id(source_id, target_id, "fixture.sql", index),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            edge_type,
            metadata: EdgeMetadata {
                file_path: "fixture.sql".to_string(),
                statement_index: index,
                statement_kind: StatementKind::CreateView,
                join_type: None,
                join_condition: None,
            },
        });
        self
    }

    /// Add a column edge
    pub fn column_edge(
        mut self,
        source: (&str, &str),
        target: (&str, &str),
        transformation: Transformation,
    ) -> Self {
        self.column_edges.push(ColumnEdge {
            source_node_id: source.0.to_string(),
            source_column: source.1.to_string(),
            target_node_id: target.0.to_string(),
            target_column: target.1.to_string(),
            transformation,
            expression: None,
            file_path: "fixture.sql".to_string(),
            statement_index: 0,
        });
        self
    }

    /// Add a statement in `file` reading `reads`
    pub fn statement(mut self, file: &str, target: Option<&str>, reads: &[&str]) -> Self {
        let index = self
            .statements
            .iter()
            .filter(|s| s.file_path == file)
            .count();
        self.statements.push(StatementRecord {
            file_path: file.to_string(),
            index,
            kind: if target.is_some() {
                StatementKind::CreateView
            } else {
                StatementKind::Select
            },
            target: target.map(str::to_string),
            reads: reads.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> LineageGraph {
        LineageGraph::from_parts(
            self.nodes,
            self.edges,
            self.column_edges,
            self.statements,
            Vec::new(),
        )
    }
}

/// A chain `table:t0 -> view:v1 -> ... -> view:v<len>`
pub fn chain(len: usize) -> LineageGraph {
    let mut fixture = GraphFixture::new().node(NodeType::Table, "t0");
    let mut previous = "table:t0".to_string();
    for i in 1..=len {
        let name = format!("v{i}");
        let id = format!("view:{name}");
        fixture = fixture.node(NodeType::View, &name).edge(&previous, &id);
        previous = id;
    }
    fixture.build()
}
