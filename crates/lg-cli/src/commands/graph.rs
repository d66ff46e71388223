//! Graph command implementation - build and print the lineage graph

use anyhow::{Context, Result};
use lg_analysis::{lineage_subgraph, resolve_depth, GraphDirection};
use lg_core::{ColumnEdge, Diagnostic, GraphStats, LineageEdge, LineageGraph, LineageNode};
use serde::Serialize;

use crate::cli::{DirectionArg, GlobalArgs, GraphArgs, GraphOutput};
use crate::commands::common::{load_graph, print_json};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphDump<'a> {
    stats: GraphStats,
    nodes: Vec<&'a LineageNode>,
    edges: &'a [LineageEdge],
    column_edges: &'a [ColumnEdge],
    diagnostics: &'a [Diagnostic],
}

/// Execute the graph command
pub async fn execute(args: &GraphArgs, global: &GlobalArgs) -> Result<()> {
    let (workspace, graph) = load_graph(global)?;

    if let Some(node) = &args.node {
        let direction = match args.direction {
            DirectionArg::Upstream => GraphDirection::Upstream,
            DirectionArg::Downstream => GraphDirection::Downstream,
            DirectionArg::Both => GraphDirection::Both,
        };
        let depth = resolve_depth(args.depth, workspace.config.traversal.default_depth);
        let sub = lineage_subgraph(&graph, node, direction, depth, &args.expand)
            .context("Failed to extract subgraph")?;
        return match args.output {
            GraphOutput::Json => print_json(&sub),
            GraphOutput::Dot => {
                print!("{}", to_dot(sub.nodes.iter(), &sub.edges, &sub.column_edges));
                Ok(())
            }
            GraphOutput::Table => {
                print_edges(&sub.edges);
                Ok(())
            }
        };
    }

    match args.output {
        GraphOutput::Json => print_json(&GraphDump {
            stats: graph.stats(),
            nodes: graph.nodes().collect(),
            edges: graph.edges(),
            column_edges: graph.column_edges(),
            diagnostics: graph.diagnostics(),
        }),
        GraphOutput::Dot => {
            print!("{}", to_dot(graph.structural_nodes(), graph.edges(), &[]));
            Ok(())
        }
        GraphOutput::Table => {
            print_summary(&graph);
            Ok(())
        }
    }
}

fn print_summary(graph: &LineageGraph) {
    let stats = graph.stats();
    println!(
        "{} table(s), {} view(s), {} CTE(s), {} external(s), {} column(s)",
        stats.tables, stats.views, stats.ctes, stats.externals, stats.columns
    );
    println!(
        "{} edge(s), {} column edge(s) from {} statement(s) in {} file(s)",
        stats.edges, stats.column_edges, stats.statements, stats.files
    );

    if !graph.edges().is_empty() {
        println!();
        print_edges(graph.edges());
    }

    if !graph.diagnostics().is_empty() {
        println!("\n{} file(s) could not be parsed:", stats.diagnostics);
        for diagnostic in graph.diagnostics() {
            println!("  {}", diagnostic);
        }
    }
}

fn print_edges(edges: &[LineageEdge]) {
    if edges.is_empty() {
        println!("No edges found.");
        return;
    }
    println!("{:<35} {:<35} {:<8} ORIGIN", "SOURCE", "TARGET", "TYPE");
    println!("{}", "-".repeat(100));
    for edge in edges {
        println!(
            "{:<35} {:<35} {:<8} {}#{}",
            edge.source_id,
            edge.target_id,
            edge.edge_type,
            edge.metadata.file_path,
            edge.metadata.statement_index
        );
    }
}

/// Render nodes and edges as a Graphviz digraph
fn to_dot<'a>(
    nodes: impl Iterator<Item = &'a LineageNode>,
    edges: &[LineageEdge],
    column_edges: &[ColumnEdge],
) -> String {
    let mut out = String::from("digraph lineage {\n  rankdir=LR;\n");
    for node in nodes {
        let shape = match node.node_type {
            lg_core::NodeType::Table => "box",
            lg_core::NodeType::View => "ellipse",
            lg_core::NodeType::Cte => "note",
            lg_core::NodeType::External => "box3d",
            lg_core::NodeType::Column => "plaintext",
        };
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\", shape={}];\n",
            node.id, node.name, shape
        ));
    }
    for edge in edges {
        let style = match edge.edge_type {
            lg_core::EdgeType::Direct => "solid",
            lg_core::EdgeType::Derived => "dashed",
        };
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [style={}];\n",
            edge.source_id, edge.target_id, style
        ));
    }
    for edge in column_edges.iter().filter(|e| !e.is_terminal()) {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\", style=dotted];\n",
            edge.source_column_id(),
            edge.target_column_id(),
            edge.transformation
        ));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
