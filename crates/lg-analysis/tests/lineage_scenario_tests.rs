//! End-to-end scenarios: SQL files -> graph -> queries

use lg_analysis::{
    normalize_depth, ChangeType, ColumnLineageResolver, FlowAnalyzer, FlowTarget, ImpactAnalyzer,
    LineageService, Severity,
};
use lg_core::test_utils::{build_graph, orders_scenario, GraphFixture, ORDERS_DDL};
use lg_core::{Config, Direction, ImpactConfig, NodeType, Transformation};

fn node(id: &str) -> FlowTarget {
    FlowTarget::Node(id.to_string())
}

// ── Orders -> daily_orders ──────────────────────────────────────────────

#[test]
fn test_orders_scenario_end_to_end() {
    let graph = orders_scenario();
    let flow = FlowAnalyzer::new(&graph);

    assert_eq!(
        flow.downstream(&node("table:orders"), 1).node_ids(),
        vec!["view:daily_orders"]
    );
    assert_eq!(
        flow.upstream(&node("view:daily_orders"), 1).node_ids(),
        vec!["table:orders"]
    );

    let column = ColumnLineageResolver::new(&graph).resolve("view:daily_orders", "total_revenue");
    let step = column.upstream[0].end().unwrap();
    assert_eq!(
        (step.node_id.as_str(), step.column_name.as_deref(), step.transformation),
        ("table:orders", Some("total"), Some(Transformation::Aggregated))
    );

    let config = ImpactConfig::default();
    let report = ImpactAnalyzer::new(&graph, &config, 5)
        .analyze(NodeType::Table, "orders", ChangeType::Drop)
        .unwrap();
    assert!(report
        .direct_impacts
        .iter()
        .any(|e| e.name == "daily_orders"));
    assert_eq!(report.summary.views_affected, 1);
}

// ── Cycles ──────────────────────────────────────────────────────────────

#[test]
fn test_recursive_cte_terminates() {
    let graph = build_graph(&[(
        "tree.sql",
        "CREATE VIEW tree AS
         WITH RECURSIVE x AS (
             SELECT id, parent_id FROM nodes WHERE parent_id IS NULL
             UNION ALL
             SELECT n.id, n.parent_id FROM nodes n JOIN x ON n.parent_id = x.id
         )
         SELECT id FROM x",
    )]);
    let down = FlowAnalyzer::new(&graph).downstream(&node("cte:tree.sql#0:x"), 10);

    let ids = down.node_ids();
    assert_eq!(ids.iter().filter(|id| **id == "cte:tree.sql#0:x").count(), 1);
    assert!(ids.contains(&"view:tree"));
}

// ── Name scoping ────────────────────────────────────────────────────────

#[test]
fn test_cte_names_do_not_leak_across_files() {
    let graph = build_graph(&[
        ("a.sql", "CREATE VIEW va AS WITH base AS (SELECT id FROM x) SELECT id FROM base;"),
        ("b.sql", "CREATE VIEW vb AS WITH base AS (SELECT id FROM y) SELECT id FROM base;"),
    ]);
    let flow = FlowAnalyzer::new(&graph);

    assert_eq!(
        flow.upstream(&node("view:va"), 5).node_ids(),
        vec!["cte:a.sql#0:base", "external:x"]
    );

    let config = ImpactConfig::default();
    let report = ImpactAnalyzer::new(&graph, &config, 5)
        .analyze(NodeType::External, "y", ChangeType::Drop)
        .unwrap();
    let affected: Vec<&str> = report
        .direct_impacts
        .iter()
        .chain(report.transitive_impacts.iter().flat_map(|l| l.entities.iter()))
        .map(|e| e.node_id.as_str())
        .collect();
    assert_eq!(affected, vec!["cte:b.sql#0:base", "view:vb"]);

    let column = ColumnLineageResolver::new(&graph).resolve("view:va", "id");
    assert!(column
        .upstream
        .iter()
        .all(|path| !path.node_ids().contains(&"external:y")));
    assert!(column
        .upstream
        .iter()
        .any(|path| path.node_ids() == vec!["view:va", "cte:a.sql#0:base", "external:x"]));
}

#[test]
fn test_schema_qualified_reference_reaches_definition() {
    let graph = build_graph(&[
        ("orders.sql", ORDERS_DDL),
        ("v.sql", "CREATE VIEW v AS SELECT id FROM public.orders"),
    ]);
    let flow = FlowAnalyzer::new(&graph);
    assert_eq!(flow.downstream(&node("table:orders"), 1).node_ids(), vec!["view:v"]);
    assert_eq!(flow.upstream(&node("view:v"), 1).node_ids(), vec!["table:orders"]);
}

#[test]
fn test_mutually_referencing_views() {
    let graph = build_graph(&[
        ("a.sql", "CREATE VIEW a AS SELECT id FROM b"),
        ("b.sql", "CREATE VIEW b AS SELECT id FROM a"),
    ]);
    let flow = FlowAnalyzer::new(&graph);
    assert_eq!(flow.downstream(&node("view:a"), 20).node_ids(), vec!["view:b", "view:a"]);

    let up = ColumnLineageResolver::new(&graph).trace("view:a", "id", Direction::Upstream);
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].node_ids(), vec!["view:a", "view:b"]);
}

// ── Depth ───────────────────────────────────────────────────────────────

#[test]
fn test_depth_clamp() {
    assert_eq!(normalize_depth(0.0, 5), 5);
    assert_eq!(normalize_depth(999.0, 5), 20);
    assert_eq!(normalize_depth(3.7, 5), 3);
}

// ── Column chain across files ───────────────────────────────────────────

#[test]
fn test_passthrough_chain_across_files() {
    let graph = build_graph(&[
        ("orders.sql", ORDERS_DDL),
        ("stg.sql", "CREATE VIEW stg_orders AS SELECT id, total FROM orders"),
        ("mart.sql", "CREATE VIEW mart_orders AS SELECT id, total FROM stg_orders"),
    ]);
    let resolver = ColumnLineageResolver::new(&graph);

    let up = resolver.trace("view:mart_orders", "total", Direction::Upstream);
    assert_eq!(up.len(), 1);
    assert_eq!(
        up[0].node_ids(),
        vec!["view:mart_orders", "view:stg_orders", "table:orders"]
    );
    assert_eq!(up[0].transformation(), Some(Transformation::Passthrough));

    let down = resolver.trace("table:orders", "total", Direction::Downstream);
    assert_eq!(down.len(), 1);
    assert_eq!(down[0].hops(), 2);
}

// ── Impact ──────────────────────────────────────────────────────────────

#[test]
fn test_severity_grows_with_affected_entities() {
    // five consumers vs. the same five plus three more
    let build = |consumers: usize| {
        let mut fixture = GraphFixture::new().node(NodeType::Table, "base");
        for i in 0..consumers {
            let name = format!("c{i}");
            fixture = fixture
                .node(NodeType::View, &name)
                .edge("table:base", &format!("view:{name}"));
        }
        fixture.build()
    };
    let (r1_graph, r2_graph) = (build(5), build(8));
    let config = ImpactConfig::default();

    let r1 = ImpactAnalyzer::new(&r1_graph, &config, 5)
        .analyze(NodeType::Table, "base", ChangeType::Modify)
        .unwrap();
    let r2 = ImpactAnalyzer::new(&r2_graph, &config, 5)
        .analyze(NodeType::Table, "base", ChangeType::Modify)
        .unwrap();
    assert_eq!(r1.summary.total_affected, 5);
    assert_eq!(r2.summary.total_affected, 8);
    assert!(r2.severity >= r1.severity);
    assert!(r2.severity >= Severity::High);
}

// ── Incremental rebuild keeps queries consistent ────────────────────────

#[test]
fn test_reprocessed_file_drops_stale_lineage() {
    let mut builder = lg_core::test_utils::builder_with(&[
        ("orders.sql", ORDERS_DDL),
        ("v.sql", "CREATE VIEW v AS SELECT total FROM orders"),
    ]);
    let before = builder.build();
    assert_eq!(
        FlowAnalyzer::new(&before).upstream(&node("view:v"), 1).node_ids(),
        vec!["table:orders"]
    );

    builder.set_file("v.sql", "CREATE VIEW v AS SELECT amount FROM payments");
    let after = builder.build();
    assert_eq!(
        FlowAnalyzer::new(&after).upstream(&node("view:v"), 1).node_ids(),
        vec!["external:payments"]
    );
    assert!(FlowAnalyzer::new(&after)
        .downstream(&node("table:orders"), 5)
        .is_empty());

    // The earlier snapshot is untouched
    assert!(before.contains("table:orders"));
    assert!(!before.contains("external:payments"));
}

// ── Protocol ────────────────────────────────────────────────────────────

#[test]
fn test_protocol_file_target() {
    let graph = orders_scenario();
    let config = Config::default();
    let json = LineageService::new(&graph, &config).handle_json(
        r#"{"command": "getDownstream", "nodeType": "file", "filePath": "orders.sql", "depth": 2}"#,
    );
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nodes"][0]["id"], "view:daily_orders");
}
