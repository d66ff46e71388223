use super::*;

#[test]
fn test_node_ids_are_lowercase_and_typed() {
    assert_eq!(node_id(NodeType::Table, "Orders"), "table:orders");
    assert_eq!(node_id(NodeType::External, "raw.Events"), "external:raw.events");
    assert_eq!(
        column_node_id("view:daily_orders", "Total_Revenue"),
        "column:view:daily_orders.total_revenue"
    );
}

#[test]
fn test_split_node_id() {
    assert_eq!(
        split_node_id("view:analytics.daily"),
        Some((NodeType::View, "analytics.daily"))
    );
    assert_eq!(split_node_id("nonsense"), None);
    assert_eq!(split_node_id("file:x.sql"), None);
}

#[test]
fn test_column_node_has_parent() {
    let node = LineageNode::column("table:orders", "Total");
    assert_eq!(node.id, "column:table:orders.total");
    assert_eq!(node.metadata.parent_id.as_deref(), Some("table:orders"));
    assert!(!node.node_type.is_structural());
}

#[test]
fn test_transformation_composition_takes_stronger() {
    use Transformation::*;
    assert_eq!(Passthrough.compose(Joined), Joined);
    assert_eq!(Renamed.compose(Joined), Renamed);
    assert_eq!(Passthrough.compose(Aggregated), Aggregated);
    assert_eq!(Aggregated.compose(Calculated), Aggregated);
    assert_eq!(Calculated.compose(Passthrough), Calculated);
}

#[test]
fn test_node_serializes_with_type_field() {
    let node = LineageNode::new(NodeType::View, "daily_orders");
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["id"], "view:daily_orders");
    assert_eq!(json["type"], "view");
    assert!(json["metadata"].get("parentId").is_none());
}

#[test]
fn test_column_edge_ids() {
    let edge = ColumnEdge {
        source_node_id: "table:orders".to_string(),
        source_column: "total".to_string(),
        target_node_id: "view:daily_orders".to_string(),
        target_column: "total_revenue".to_string(),
        transformation: Transformation::Aggregated,
        expression: Some("SUM(total)".to_string()),
        file_path: "views.sql".to_string(),
        statement_index: 0,
    };
    assert_eq!(edge.source_column_id(), "column:table:orders.total");
    assert_eq!(
        edge.target_column_id(),
        "column:view:daily_orders.total_revenue"
    );
    assert!(!edge.is_terminal());
    let json = serde_json::to_value(&edge).unwrap();
    assert_eq!(json["transformation"], "aggregated");
    assert_eq!(json["sourceNodeId"], "table:orders");
}

#[test]
fn test_cte_node_id_is_statement_scoped() {
    assert_eq!(cte_node_id("models/a.sql", 2, "Base"), "cte:models/a.sql#2:base");
    assert_ne!(cte_node_id("a.sql", 0, "base"), cte_node_id("b.sql", 0, "base"));
    assert_ne!(cte_node_id("a.sql", 0, "base"), cte_node_id("a.sql", 1, "base"));
    let (node_type, _) = split_node_id(&cte_node_id("a.sql", 0, "base")).unwrap();
    assert_eq!(node_type, NodeType::Cte);
}

#[test]
fn test_direction_petgraph() {
    assert_eq!(Direction::Upstream.petgraph(), petgraph::Direction::Incoming);
    assert_eq!(
        Direction::Downstream.petgraph(),
        petgraph::Direction::Outgoing
    );
}

#[test]
fn test_diagnostic_display() {
    let diag = Diagnostic {
        file_path: "bad.sql".to_string(),
        message: "unexpected token".to_string(),
        line: Some(3),
        column: Some(7),
    };
    assert_eq!(diag.to_string(), "bad.sql:3:7: unexpected token");
}
