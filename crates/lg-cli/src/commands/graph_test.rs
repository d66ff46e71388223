use super::*;
use lg_core::test_utils::orders_scenario;

#[test]
fn test_to_dot_structural() {
    let graph = orders_scenario();
    let dot = to_dot(graph.structural_nodes(), graph.edges(), &[]);

    assert!(dot.starts_with("digraph lineage {"));
    assert!(dot.contains("\"table:orders\" [label=\"orders\", shape=box];"));
    assert!(dot.contains("\"view:daily_orders\" [label=\"daily_orders\", shape=ellipse];"));
    assert!(dot.contains("\"table:orders\" -> \"view:daily_orders\" [style=solid];"));
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn test_to_dot_column_edges() {
    let graph = orders_scenario();
    let dot = to_dot(std::iter::empty(), &[], graph.column_edges());
    assert!(dot.contains(
        "\"column:table:orders.total\" -> \"column:view:daily_orders.total_revenue\" [label=\"aggregated\", style=dotted];"
    ));
}
