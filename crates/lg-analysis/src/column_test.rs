use super::*;
use lg_core::test_utils::{build_graph, orders_scenario, GraphFixture};
use lg_core::{NodeType, Transformation};

fn passthrough_chain() -> LineageGraph {
    GraphFixture::new()
        .node(NodeType::Table, "a")
        .node(NodeType::View, "b")
        .node(NodeType::View, "c")
        .edge("table:a", "view:b")
        .edge("view:b", "view:c")
        .column_edge(("table:a", "col"), ("view:b", "col"), Transformation::Passthrough)
        .column_edge(("view:b", "col"), ("view:c", "col"), Transformation::Passthrough)
        .build()
}

#[test]
fn test_orders_scenario_aggregated_step() {
    let graph = orders_scenario();
    let lineage = ColumnLineageResolver::new(&graph).resolve("view:daily_orders", "TOTAL_REVENUE");

    assert!(lineage.is_available());
    assert_eq!(lineage.column_name, "total_revenue");
    assert_eq!(lineage.upstream.len(), 1);
    assert!(lineage.downstream.is_empty());

    let step = lineage.upstream[0].end().unwrap();
    assert_eq!(step.node_id, "table:orders");
    assert_eq!(step.column_name.as_deref(), Some("total"));
    assert_eq!(step.transformation, Some(Transformation::Aggregated));
    assert!(step
        .expression
        .as_deref()
        .unwrap()
        .to_uppercase()
        .contains("SUM"));
}

#[test]
fn test_orders_scenario_downstream_from_base_column() {
    let graph = orders_scenario();
    let lineage = ColumnLineageResolver::new(&graph).resolve("table:orders", "total");

    assert!(lineage.upstream.is_empty());
    assert_eq!(lineage.downstream.len(), 1);
    assert_eq!(
        lineage.downstream[0].node_ids(),
        vec!["table:orders", "view:daily_orders"]
    );
}

#[test]
fn test_passthrough_chain_round_trip() {
    let graph = passthrough_chain();
    let resolver = ColumnLineageResolver::new(&graph);

    let up = resolver.trace("view:c", "col", Direction::Upstream);
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].node_ids(), vec!["view:c", "view:b", "table:a"]);
    assert_eq!(up[0].transformation(), Some(Transformation::Passthrough));

    let down = resolver.trace("table:a", "col", Direction::Downstream);
    assert_eq!(down.len(), 1);
    assert_eq!(down[0].node_ids(), vec!["table:a", "view:b", "view:c"]);
}

#[test]
fn test_calculated_column_fans_out() {
    let graph = build_graph(&[
        ("t.sql", "CREATE TABLE t (a INTEGER, b INTEGER)"),
        ("v.sql", "CREATE VIEW v AS SELECT a + b AS total FROM t"),
    ]);
    let lineage = ColumnLineageResolver::new(&graph).resolve("view:v", "total");

    let mut sources: Vec<&str> = lineage
        .upstream
        .iter()
        .map(|p| p.end().unwrap().column_name.as_deref().unwrap())
        .collect();
    sources.sort_unstable();
    assert_eq!(sources, vec!["a", "b"]);
    assert!(lineage
        .upstream
        .iter()
        .all(|p| p.transformation() == Some(Transformation::Calculated)));
}

#[test]
fn test_literal_stops_at_source_marker() {
    let graph = build_graph(&[("v.sql", "CREATE VIEW v AS SELECT 1 AS one, id FROM items")]);
    let up = ColumnLineageResolver::new(&graph).trace("view:v", "one", Direction::Upstream);

    assert_eq!(up.len(), 1);
    let end = up[0].end().unwrap();
    assert_eq!(end.node_id, "view:v");
    assert_eq!(end.transformation, Some(Transformation::Source));
    assert_eq!(up[0].transformation(), None);
}

#[test]
fn test_unknown_column_has_message() {
    let graph = orders_scenario();
    let lineage = ColumnLineageResolver::new(&graph).resolve("table:orders", "nope");

    assert!(!lineage.is_available());
    assert!(lineage.upstream.is_empty() && lineage.downstream.is_empty());
    assert!(lineage.message.unwrap().contains("No lineage available"));
}

#[test]
fn test_column_cycle_terminates() {
    let graph = GraphFixture::new()
        .node(NodeType::View, "a")
        .node(NodeType::View, "b")
        .column_edge(("view:a", "x"), ("view:b", "x"), Transformation::Passthrough)
        .column_edge(("view:b", "x"), ("view:a", "x"), Transformation::Passthrough)
        .build();
    let up = ColumnLineageResolver::new(&graph).trace("view:a", "x", Direction::Upstream);

    assert_eq!(up.len(), 1);
    assert_eq!(up[0].node_ids(), vec!["view:a", "view:b"]);
}

#[test]
fn test_max_paths_caps_output() {
    let mut fixture = GraphFixture::new().node(NodeType::View, "wide");
    for i in 0..5 {
        let name = format!("s{i}");
        fixture = fixture.node(NodeType::Table, &name).column_edge(
            (&format!("table:{name}"), "v"),
            ("view:wide", "total"),
            Transformation::Calculated,
        );
    }
    let graph = fixture.build();

    let resolver = ColumnLineageResolver::new(&graph);
    assert_eq!(resolver.trace("view:wide", "total", Direction::Upstream).len(), 5);
    let capped = resolver.with_max_paths(2);
    assert_eq!(capped.trace("view:wide", "total", Direction::Upstream).len(), 2);
}

#[test]
fn test_max_depth_truncates_chain() {
    let graph = passthrough_chain();
    let up = ColumnLineageResolver::new(&graph)
        .with_max_depth(1)
        .trace("view:c", "col", Direction::Upstream);

    assert_eq!(up.len(), 1);
    assert_eq!(up[0].node_ids(), vec!["view:c", "view:b"]);
}
