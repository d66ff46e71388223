use super::*;
use lg_core::test_utils::{chain, orders_scenario};
use lg_core::NodeType;

#[test]
fn test_both_directions_collects_neighbors() {
    let graph = chain(4);
    let sub = lineage_subgraph(&graph, "view:v2", GraphDirection::Both, 1, &[]).unwrap();

    let ids: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["view:v2", "view:v1", "view:v3"]);
    assert_eq!(sub.edges.len(), 2);
    assert!(sub.column_edges.is_empty());
}

#[test]
fn test_single_direction() {
    let graph = chain(4);
    let sub = lineage_subgraph(&graph, "view:v2", GraphDirection::Upstream, 5, &[]).unwrap();
    let ids: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["view:v2", "view:v1", "table:t0"]);
}

#[test]
fn test_expanded_nodes_add_column_edges() {
    let graph = orders_scenario();

    let collapsed =
        lineage_subgraph(&graph, "table:orders", GraphDirection::Downstream, 1, &[]).unwrap();
    assert!(collapsed.nodes.iter().all(|n| n.node_type != NodeType::Column));

    let expanded = lineage_subgraph(
        &graph,
        "table:orders",
        GraphDirection::Downstream,
        1,
        &["view:daily_orders".to_string()],
    )
    .unwrap();
    assert!(expanded
        .column_edges
        .iter()
        .any(|e| e.source_column == "total" && e.target_column == "total_revenue"));
    assert!(expanded
        .nodes
        .iter()
        .any(|n| n.id == "column:view:daily_orders.total_revenue"));
    assert!(expanded
        .nodes
        .iter()
        .any(|n| n.id == "column:table:orders.total"));
}

#[test]
fn test_expanded_outside_reachable_set_is_ignored() {
    let graph = chain(3);
    let sub = lineage_subgraph(
        &graph,
        "view:v3",
        GraphDirection::Upstream,
        1,
        &["table:t0".to_string()],
    )
    .unwrap();
    assert!(sub.column_edges.is_empty());
    assert_eq!(sub.nodes.len(), 2);
}

#[test]
fn test_unknown_root() {
    let graph = chain(1);
    let err = lineage_subgraph(&graph, "view:nope", GraphDirection::Both, 3, &[]).unwrap_err();
    assert!(matches!(err, AnalysisError::NodeNotFound { .. }));
}
