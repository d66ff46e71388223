//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// lineagegraph - SQL dependency lineage and change-impact analysis
#[derive(Parser, Debug)]
#[command(name = "lg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the workspace directory
    #[arg(short = 'w', long, global = true, default_value = ".", env = "LG_WORKSPACE")]
    pub workspace: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override SQL dialect
    #[arg(short, long, global = true)]
    pub dialect: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the lineage graph and print it
    Graph(GraphArgs),

    /// Show what feeds a node
    Upstream(FlowArgs),

    /// Show what consumes a node
    Downstream(FlowArgs),

    /// Trace one column upstream and downstream
    Column(ColumnArgs),

    /// Analyze the impact of changing an entity
    Impact(ImpactArgs),

    /// Show details of a table or view
    Explore(ExploreArgs),

    /// Answer JSON requests on stdin, rebuilding on file events
    Serve(ServeArgs),
}

/// Output formats for query commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Table,
    /// JSON
    Json,
}

/// Output formats for the graph command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOutput {
    /// Summary and diagnostics
    Table,
    /// Full JSON dump
    Json,
    /// Graphviz DOT
    Dot,
}

/// Direction for the graph command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    Upstream,
    Downstream,
    Both,
}

/// Entity kinds accepted by `impact`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityArg {
    Table,
    View,
    Cte,
    External,
}

/// Change kinds accepted by `impact`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeArg {
    Modify,
    Drop,
    Rename,
}

/// Severity levels for `--fail-on`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: GraphOutput,

    /// Restrict output to the subgraph around this node id
    #[arg(short, long)]
    pub node: Option<String>,

    /// Direction to expand from --node
    #[arg(long, value_enum, default_value = "both")]
    pub direction: DirectionArg,

    /// Traversal depth (1-20)
    #[arg(long)]
    pub depth: Option<f64>,

    /// Node ids whose column lineage to include (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub expand: Vec<String>,
}

/// Arguments for the upstream and downstream commands
#[derive(Args, Debug)]
pub struct FlowArgs {
    /// Node id (e.g. view:daily_orders)
    #[arg(required_unless_present = "file")]
    pub node: Option<String>,

    /// Start from every node defined in this file instead
    #[arg(short, long, conflicts_with = "node")]
    pub file: Option<String>,

    /// Traversal depth (1-20)
    #[arg(long)]
    pub depth: Option<f64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the column command
#[derive(Args, Debug)]
pub struct ColumnArgs {
    /// Node id owning the column
    pub node: String,

    /// Column name
    pub column: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the impact command
#[derive(Args, Debug)]
pub struct ImpactArgs {
    /// Kind of entity being changed
    #[arg(value_enum)]
    pub entity: EntityArg,

    /// Entity name
    pub name: String,

    /// Kind of change
    #[arg(long, value_enum, default_value = "modify")]
    pub change: ChangeArg,

    /// Traversal depth (1-20)
    #[arg(long)]
    pub depth: Option<f64>,

    /// Exit with code 1 when severity is at or above this level
    #[arg(long, value_enum)]
    pub fail_on: Option<SeverityArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the explore command
#[derive(Args, Debug)]
pub struct ExploreArgs {
    /// Table or view name
    pub table: String,

    /// Explicit node id (takes precedence over the name)
    #[arg(long)]
    pub node_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the rebuild debounce window in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
