//! Explore command implementation

use anyhow::{Context, Result};
use lg_analysis::{explore_table, NeighborSummary, TableDetail};

use crate::cli::{ExploreArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_graph, print_json};

/// Execute the explore command
pub async fn execute(args: &ExploreArgs, global: &GlobalArgs) -> Result<()> {
    let (_, graph) = load_graph(global)?;
    let detail = explore_table(&graph, &args.table, args.node_id.as_deref())
        .with_context(|| format!("Failed to explore '{}'", args.table))?;

    match args.output {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Table => {
            print!("{}", render_detail(&detail));
            Ok(())
        }
    }
}

fn render_detail(detail: &TableDetail) -> String {
    let node = &detail.node;
    let mut out = format!("{} ({})\n", node.name, node.node_type);
    out.push_str(&format!("  id: {}\n", node.id));
    if let Some(file) = &node.metadata.file_path {
        out.push_str(&format!("  defined in: {}\n", file));
    }

    out.push_str(&format!("\nColumns ({}):\n", detail.columns.len()));
    for column in &detail.columns {
        out.push_str(&format!(
            "  {:<30} {} upstream, {} downstream\n",
            column.name, column.upstream_count, column.downstream_count
        ));
    }

    render_neighbors(&mut out, "Upstream", &detail.upstream);
    render_neighbors(&mut out, "Downstream", &detail.downstream);

    out.push_str(&format!("\nStatements ({}):\n", detail.statements.len()));
    for statement in &detail.statements {
        out.push_str(&format!(
            "  {}#{} {}\n",
            statement.file_path, statement.index, statement.kind
        ));
    }
    out
}

fn render_neighbors(out: &mut String, title: &str, neighbors: &[NeighborSummary]) {
    out.push_str(&format!("\n{} ({}):\n", title, neighbors.len()));
    for n in neighbors {
        let join = n
            .join_type
            .as_deref()
            .map(|j| format!(", {} join", j))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<40} {} x{}{}\n",
            n.node_id, n.edge_type, n.edge_count, join
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::test_utils::orders_scenario;

    #[test]
    fn test_render_detail_orders() {
        let graph = orders_scenario();
        let detail = explore_table(&graph, "orders", None).unwrap();
        let text = render_detail(&detail);

        assert!(text.starts_with("orders (table)\n"));
        assert!(text.contains("  id: table:orders\n"));
        assert!(text.contains("\n  total "));
        assert!(text.contains("Upstream (0):"));
        assert!(text.contains("Downstream (1):"));
        assert!(text.contains("view:daily_orders"));
    }
}
