//! Impact command implementation

use anyhow::{Context, Result};
use lg_analysis::{resolve_depth, ChangeType, ImpactAnalyzer, ImpactReport, Severity};
use lg_core::NodeType;

use crate::cli::{ChangeArg, EntityArg, GlobalArgs, ImpactArgs, OutputFormat, SeverityArg};
use crate::commands::common::{load_graph, print_json, ExitCode};

/// Execute the impact command
pub async fn execute(args: &ImpactArgs, global: &GlobalArgs) -> Result<()> {
    let (workspace, graph) = load_graph(global)?;
    let config = &workspace.config;

    let depth = resolve_depth(args.depth, config.traversal.default_depth);
    let report = ImpactAnalyzer::new(&graph, &config.impact, depth)
        .analyze(node_type(args.entity), &args.name, change_type(args.change))
        .context("Impact analysis failed")?;

    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    if let Some(threshold) = args.fail_on {
        if report.severity >= severity(threshold) {
            log::info!(
                "Severity {} is at or above --fail-on {}",
                report.severity,
                severity(threshold)
            );
            return Err(ExitCode(1).into());
        }
    }
    Ok(())
}

fn node_type(entity: EntityArg) -> NodeType {
    match entity {
        EntityArg::Table => NodeType::Table,
        EntityArg::View => NodeType::View,
        EntityArg::Cte => NodeType::Cte,
        EntityArg::External => NodeType::External,
    }
}

fn change_type(change: ChangeArg) -> ChangeType {
    match change {
        ChangeArg::Modify => ChangeType::Modify,
        ChangeArg::Drop => ChangeType::Drop,
        ChangeArg::Rename => ChangeType::Rename,
    }
}

fn severity(level: SeverityArg) -> Severity {
    match level {
        SeverityArg::Low => Severity::Low,
        SeverityArg::Medium => Severity::Medium,
        SeverityArg::High => Severity::High,
        SeverityArg::Critical => Severity::Critical,
    }
}

fn print_report(report: &ImpactReport) {
    let summary = &report.summary;
    println!(
        "Impact of {} on {} '{}'",
        report.change_type, report.target.node_type, report.target.name
    );
    println!(
        "Severity: {} (score {})\n",
        report.severity.to_string().to_uppercase(),
        report.score
    );

    println!("Direct impacts ({}):", report.direct_impacts.len());
    for entity in &report.direct_impacts {
        println!("  {:<40} {}", entity.node_id, entity.file_path.as_deref().unwrap_or("-"));
    }
    for level in &report.transitive_impacts {
        println!("\nDepth {} ({}):", level.depth, level.entities.len());
        for entity in &level.entities {
            println!("  {:<40} {}", entity.node_id, entity.file_path.as_deref().unwrap_or("-"));
        }
    }

    println!(
        "\n{} affected: {} table(s), {} view(s), {} CTE(s), {} external(s); {} query(ies) in {} file(s)",
        summary.total_affected,
        summary.tables_affected,
        summary.views_affected,
        summary.ctes_affected,
        summary.externals_affected,
        summary.queries_affected,
        summary.files_affected
    );

    if !report.suggestions.is_empty() {
        println!("\nSuggestions:");
        for suggestion in &report.suggestions {
            println!("  - {}", suggestion);
        }
    }
}
