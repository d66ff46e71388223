use super::*;

#[test]
fn test_parse_minimal_config() {
    let config = Config::parse("name: analytics\n").unwrap();
    assert_eq!(config.name.as_deref(), Some("analytics"));
    assert_eq!(config.dialect, SqlDialect::DuckDb);
    assert_eq!(config.sql_paths, vec!["."]);
    assert_eq!(config.traversal.default_depth, 5);
    assert_eq!(config.traversal.max_paths, 256);
    assert_eq!(config.rebuild.debounce_ms, 300);
}

#[test]
fn test_empty_config_is_default() {
    let config = Config::parse("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: warehouse
dialect: snowflake
sql_paths: [models, scripts]
exclude_paths: [scratch]
external_tables:
  - raw.events
  - raw.customers
traversal:
  default_depth: 8
  max_paths: 32
rebuild:
  debounce_ms: 50
impact:
  weights:
    table: 5
  thresholds:
    medium: 2
    high: 6
    critical: 10
  change_factors:
    drop: 3
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.dialect, SqlDialect::Snowflake);
    assert_eq!(config.sql_paths, vec!["models", "scripts"]);
    assert_eq!(config.exclude_paths, vec!["scratch"]);
    assert!(config.is_external_table("RAW.EVENTS"));
    assert!(!config.is_external_table("orders"));
    assert_eq!(config.traversal.default_depth, 8);
    assert_eq!(config.rebuild.debounce_ms, 50);
    assert_eq!(config.impact.weights.table, 5);
    assert_eq!(config.impact.weights.view, 2);
    assert_eq!(config.impact.thresholds.critical, 10);
    assert_eq!(config.impact.change_factors.drop, 3);
    assert_eq!(config.impact.change_factors.rename, 2);
}

#[test]
fn test_unknown_field_rejected() {
    let result = Config::parse("name: x\nmodel_paths: [models]\n");
    assert!(matches!(result, Err(CoreError::YamlParse(_))));
}

#[test]
fn test_load_reports_parse_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lineage.yml");
    std::fs::write(&path, "traversal: [not, a, map]\n").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigParseError { .. }));
    assert!(err.to_string().contains("lineage.yml"));
}

#[test]
fn test_unknown_dialect_rejected() {
    let result = Config::parse("dialect: cobol\n");
    assert!(result.is_err());
}

#[test]
fn test_depth_out_of_range() {
    let err = Config::parse("traversal:\n  default_depth: 0\n").unwrap_err();
    assert!(err.to_string().contains("[L003]"));

    let err = Config::parse("traversal:\n  default_depth: 21\n").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_zero_max_paths_rejected() {
    let result = Config::parse("traversal:\n  max_paths: 0\n");
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_thresholds_must_increase() {
    let yaml = "impact:\n  thresholds:\n    medium: 10\n    high: 5\n";
    let result = Config::parse(yaml);
    assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
}

#[test]
fn test_weights_by_node_type() {
    let weights = ImpactWeights::default();
    assert_eq!(weights.for_node_type(NodeType::Table), 3);
    assert_eq!(weights.for_node_type(NodeType::View), 2);
    assert_eq!(weights.for_node_type(NodeType::Cte), 1);
    assert_eq!(weights.for_node_type(NodeType::Column), 0);
}

#[test]
fn test_load_missing_file() {
    let result = Config::load(Path::new("/definitely/not/here/lineage.yml"));
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_load_from_dir_without_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_dir_reads_yaml_variant() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lineage.yaml"), "dialect: postgres\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.dialect, SqlDialect::Postgres);
}

#[test]
fn test_load_from_missing_dir() {
    let result = Config::load_from_dir(Path::new("/definitely/not/here"));
    assert!(matches!(result, Err(CoreError::WorkspaceNotFound { .. })));
}

#[test]
fn test_absolute_paths() {
    let config = Config::parse("sql_paths: [models]\nexclude_paths: [models/tmp]\n").unwrap();
    let root = Path::new("/tmp/ws");
    assert_eq!(config.sql_paths_absolute(root), vec![root.join("models")]);
    assert_eq!(
        config.exclude_paths_absolute(root),
        vec![root.join("models/tmp")]
    );
}
