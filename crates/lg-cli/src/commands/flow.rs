//! Upstream/downstream command implementation

use anyhow::{bail, Result};
use lg_analysis::{resolve_depth, FlowAnalyzer, FlowResult, FlowTarget};
use lg_core::Direction;

use crate::cli::{FlowArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{format_path, load_graph, print_json};

/// Execute the upstream or downstream command
pub async fn execute(args: &FlowArgs, global: &GlobalArgs, direction: Direction) -> Result<()> {
    let (workspace, graph) = load_graph(global)?;
    let target = flow_target(args)?;

    if let FlowTarget::Node(id) = &target {
        if !graph.contains(id) {
            bail!("Node '{}' not found in the lineage graph", id);
        }
    }

    let depth = resolve_depth(args.depth, workspace.config.traversal.default_depth);
    let result = FlowAnalyzer::new(&graph).traverse(&target, direction, depth);

    match args.output {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => {
            print_flow(&result, direction);
            Ok(())
        }
    }
}

fn flow_target(args: &FlowArgs) -> Result<FlowTarget> {
    match (&args.node, &args.file) {
        (_, Some(file)) => Ok(FlowTarget::File(file.clone())),
        (Some(node), None) => Ok(FlowTarget::Node(node.clone())),
        (None, None) => bail!("Either a node id or --file is required"),
    }
}

fn print_flow(result: &FlowResult, direction: Direction) {
    if result.is_empty() {
        println!("No {} dependencies found.", direction);
        return;
    }

    println!("{:<40} {:<10} {:<6} PATH", "NODE", "TYPE", "DEPTH");
    println!("{}", "-".repeat(100));
    for (node, path) in result.nodes.iter().zip(&result.paths) {
        println!(
            "{:<40} {:<10} {:<6} {}",
            node.id,
            node.node_type,
            path.hops(),
            format_path(path)
        );
    }
    println!("\n{} node(s) {}", result.nodes.len(), direction);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(node: Option<&str>, file: Option<&str>) -> FlowArgs {
        FlowArgs {
            node: node.map(String::from),
            file: file.map(String::from),
            depth: None,
            output: OutputFormat::Table,
        }
    }

    #[test]
    fn test_flow_target_node() {
        let target = flow_target(&args(Some("view:daily_orders"), None)).unwrap();
        assert_eq!(target, FlowTarget::Node("view:daily_orders".to_string()));
    }

    #[test]
    fn test_flow_target_file() {
        let target = flow_target(&args(None, Some("orders.sql"))).unwrap();
        assert_eq!(target, FlowTarget::File("orders.sql".to_string()));
    }

    #[test]
    fn test_flow_target_missing() {
        assert!(flow_target(&args(None, None)).is_err());
    }
}
