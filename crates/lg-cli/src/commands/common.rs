//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use lg_analysis::LineagePath;
use lg_core::{Config, LineageGraph, Workspace};
use lg_sql::SqlDialect;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; never shown to the user
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Open the workspace, applying `--config` and `--dialect` overrides
pub(crate) fn open_workspace(global: &GlobalArgs) -> Result<Workspace> {
    let root = Path::new(&global.workspace);
    let mut workspace = Workspace::open(root)
        .with_context(|| format!("Failed to open workspace '{}'", global.workspace))?;

    if let Some(config_path) = &global.config {
        workspace.config = Config::load(Path::new(config_path))
            .with_context(|| format!("Failed to load config '{}'", config_path))?;
    }
    if let Some(dialect) = &global.dialect {
        workspace.config.dialect = SqlDialect::from_name(dialect).context("Invalid SQL dialect")?;
    }
    Ok(workspace)
}

/// Open the workspace and build one graph snapshot
pub(crate) fn load_graph(global: &GlobalArgs) -> Result<(Workspace, LineageGraph)> {
    let workspace = open_workspace(global)?;
    let builder = workspace.load().context("Failed to index workspace")?;
    let graph = builder.build();
    for diagnostic in graph.diagnostics() {
        log::warn!("{}", diagnostic);
    }
    Ok((workspace, graph))
}

/// Pretty-print a value as JSON on stdout
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line rendering of a path: `a -> b [aggregated] -> c`
pub(crate) fn format_path(path: &LineagePath) -> String {
    let mut out = String::new();
    for (i, step) in path.steps().iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        out.push_str(&step.node_id);
        if let Some(column) = &step.column_name {
            out.push('.');
            out.push_str(column);
        }
        if let Some(t) = step.transformation {
            out.push_str(&format!(" [{}]", t));
        }
    }
    out
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
