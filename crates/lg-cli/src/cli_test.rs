use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_parse_impact() {
    let cli = Cli::parse_from(["lg", "impact", "table", "orders", "--change", "drop", "--fail-on", "high"]);
    let Commands::Impact(args) = cli.command else {
        panic!("expected impact");
    };
    assert_eq!(args.entity, EntityArg::Table);
    assert_eq!(args.name, "orders");
    assert_eq!(args.change, ChangeArg::Drop);
    assert_eq!(args.fail_on, Some(SeverityArg::High));
}

#[test]
fn test_parse_flow_with_file() {
    let cli = Cli::parse_from(["lg", "-w", "/tmp/ws", "downstream", "--file", "orders.sql", "--depth", "3"]);
    assert_eq!(cli.global.workspace, "/tmp/ws");
    let Commands::Downstream(args) = cli.command else {
        panic!("expected downstream");
    };
    assert!(args.node.is_none());
    assert_eq!(args.file.as_deref(), Some("orders.sql"));
    assert_eq!(args.depth, Some(3.0));
}

#[test]
fn test_flow_requires_node_or_file() {
    assert!(Cli::try_parse_from(["lg", "upstream"]).is_err());
}

#[test]
fn test_graph_expand_is_comma_separated() {
    let cli = Cli::parse_from(["lg", "graph", "--node", "table:orders", "--expand", "table:orders,view:v"]);
    let Commands::Graph(args) = cli.command else {
        panic!("expected graph");
    };
    assert_eq!(args.expand, vec!["table:orders", "view:v"]);
}
