use super::*;
use lg_core::test_utils::{chain, orders_scenario};
use serde_json::Value;

fn call(graph: &LineageGraph, raw: &str) -> Value {
    let config = Config::default();
    let json = LineageService::new(graph, &config).handle_json(raw);
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_parse_requests() {
    let req = Request::parse(r#"{"command": "getUpstream", "nodeId": "view:v", "depth": 3}"#).unwrap();
    let Request::GetUpstream(params) = req else {
        panic!("expected getUpstream");
    };
    assert_eq!(params.target().unwrap(), FlowTarget::Node("view:v".to_string()));
    assert_eq!(params.depth, Some(3.0));

    let req = Request::parse(
        r#"{"command": "getDownstream", "nodeId": {"nodeType": "file", "filePath": "a.sql"}}"#,
    )
    .unwrap();
    let Request::GetDownstream(params) = req else {
        panic!("expected getDownstream");
    };
    assert_eq!(params.target().unwrap(), FlowTarget::File("a.sql".to_string()));

    let req = Request::parse(
        r#"{"command": "analyzeImpact", "type": "table", "name": "orders", "changeType": "drop"}"#,
    )
    .unwrap();
    assert!(matches!(
        req,
        Request::AnalyzeImpact(ImpactParams {
            change_type: ChangeType::Drop,
            ..
        })
    ));
}

#[test]
fn test_flat_file_selector() {
    let params = FlowParams {
        node_type: Some("file".to_string()),
        file_path: Some("orders.sql".to_string()),
        ..FlowParams::default()
    };
    assert_eq!(params.target().unwrap(), FlowTarget::File("orders.sql".to_string()));
    assert!(FlowParams::default().target().is_err());
}

#[test]
fn test_get_upstream_response_shape() {
    let graph = orders_scenario();
    let value = call(&graph, r#"{"command": "getUpstream", "nodeId": "view:daily_orders", "depth": 1}"#);

    assert_eq!(value["nodes"][0]["id"], "table:orders");
    assert_eq!(value["nodes"][0]["type"], "table");
    assert_eq!(value["paths"][0][0]["nodeId"], "view:daily_orders");
    assert_eq!(value["paths"][0][1]["nodeId"], "table:orders");
    assert_eq!(value["paths"][0][1]["edgeType"], "direct");
}

#[test]
fn test_depth_is_normalized() {
    let graph = chain(25);
    let value = call(&graph, r#"{"command": "getDownstream", "nodeId": "table:t0", "depth": 999}"#);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 20);

    // invalid depth falls back to the configured default (5)
    let value = call(&graph, r#"{"command": "getDownstream", "nodeId": "table:t0", "depth": 0}"#);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 5);
}

#[test]
fn test_select_column() {
    let graph = orders_scenario();
    let value = call(
        &graph,
        r#"{"command": "selectColumn", "tableId": "view:daily_orders", "columnName": "total_revenue"}"#,
    );
    assert_eq!(value["tableId"], "view:daily_orders");
    assert_eq!(value["columnName"], "total_revenue");
    let step = &value["upstream"][0][1];
    assert_eq!(step["nodeId"], "table:orders");
    assert_eq!(step["columnName"], "total");
    assert_eq!(step["transformation"], "aggregated");

    let missing = call(
        &graph,
        r#"{"command": "selectColumn", "tableId": "view:daily_orders", "columnName": "nope"}"#,
    );
    assert!(missing["message"].as_str().unwrap().contains("No lineage available"));
}

#[test]
fn test_analyze_impact() {
    let graph = orders_scenario();
    let value = call(
        &graph,
        r#"{"command": "analyzeImpact", "type": "table", "name": "orders", "changeType": "drop"}"#,
    );
    assert_eq!(value["directImpacts"][0]["nodeId"], "view:daily_orders");
    assert_eq!(value["summary"]["viewsAffected"], 1);
    assert_eq!(value["severity"], "medium");
}

#[test]
fn test_errors_are_values() {
    let graph = orders_scenario();

    let missing = call(
        &graph,
        r#"{"command": "analyzeImpact", "type": "view", "name": "ghost", "changeType": "modify"}"#,
    );
    assert!(missing["error"].as_str().unwrap().starts_with("[Q002]"));

    let bad_type = call(
        &graph,
        r#"{"command": "analyzeImpact", "type": "column", "name": "x", "changeType": "modify"}"#,
    );
    assert!(bad_type["error"].as_str().unwrap().starts_with("[Q004]"));

    let garbage = call(&graph, "not json");
    assert!(garbage["error"].as_str().unwrap().starts_with("[Q004]"));

    let unknown = call(&graph, r#"{"command": "dropEverything"}"#);
    assert!(unknown["error"].is_string());

    let explore = call(&graph, r#"{"command": "exploreTable", "tableName": "ghost"}"#);
    assert!(explore["error"].is_string());
}

#[test]
fn test_lineage_graph_and_explore() {
    let graph = orders_scenario();
    let value = call(
        &graph,
        r#"{"command": "getLineageGraph", "nodeId": "table:orders", "direction": "downstream", "depth": 2, "expandedNodes": ["table:orders"]}"#,
    );
    assert_eq!(value["rootId"], "table:orders");
    assert_eq!(value["edges"].as_array().unwrap().len(), 1);
    assert!(!value["columnEdges"].as_array().unwrap().is_empty());

    let detail = call(&graph, r#"{"command": "exploreTable", "tableName": "orders"}"#);
    assert_eq!(detail["node"]["id"], "table:orders");
    assert_eq!(detail["downstream"][0]["nodeId"], "view:daily_orders");
}

#[test]
fn test_explore_by_node_id_only() {
    let graph = orders_scenario();
    let detail = call(&graph, r#"{"command": "exploreTable", "nodeId": "view:daily_orders"}"#);
    assert_eq!(detail["node"]["id"], "view:daily_orders");
    assert_eq!(detail["upstream"][0]["nodeId"], "table:orders");

    let empty = call(&graph, r#"{"command": "exploreTable"}"#);
    assert!(empty["error"].as_str().unwrap().starts_with("[Q004]"));
}
