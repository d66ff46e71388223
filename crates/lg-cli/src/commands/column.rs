//! Column command implementation

use anyhow::{bail, Result};
use lg_analysis::{AnalysisError, ColumnLineage, ColumnLineageResolver};

use crate::cli::{ColumnArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{format_path, load_graph, print_json};

/// Execute the column command
pub async fn execute(args: &ColumnArgs, global: &GlobalArgs) -> Result<()> {
    let (workspace, graph) = load_graph(global)?;

    if !graph.contains(&args.node) {
        return Err(AnalysisError::NodeNotFound {
            id: args.node.clone(),
        }
        .into());
    }

    let lineage = ColumnLineageResolver::new(&graph)
        .with_max_paths(workspace.config.traversal.max_paths)
        .resolve(&args.node, &args.column);

    if !lineage.is_available() {
        bail!(AnalysisError::ColumnNotFound {
            node_id: args.node.clone(),
            column: lineage.column_name,
        });
    }

    match args.output {
        OutputFormat::Json => print_json(&lineage),
        OutputFormat::Table => {
            print_lineage(&lineage);
            Ok(())
        }
    }
}

fn print_lineage(lineage: &ColumnLineage) {
    println!("{}.{}", lineage.table_id, lineage.column_name);

    println!("\nUpstream ({}):", lineage.upstream.len());
    if lineage.upstream.is_empty() {
        println!("  (none)");
    }
    for path in &lineage.upstream {
        println!("  {}", format_path(path));
    }

    println!("\nDownstream ({}):", lineage.downstream.len());
    if lineage.downstream.is_empty() {
        println!("  (none)");
    }
    for path in &lineage.downstream {
        println!("  {}", format_path(path));
    }
}
