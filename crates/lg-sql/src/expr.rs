//! Column-level lineage of a single SQL expression
//!
//! Walks an expression tree and records which input columns it reads and
//! what shape of computation produces the value. Qualifiers are kept as
//! written (usually an alias); resolving them against the FROM clause is
//! left to the graph builder, which knows the whole workspace.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    visit_expressions, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Ident, ObjectName,
};
use std::ops::ControlFlow;

/// Aggregate functions recognised across the supported dialects
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "sum",
    "count",
    "avg",
    "min",
    "max",
    "mean",
    "median",
    "mode",
    "stddev",
    "stddev_pop",
    "stddev_samp",
    "variance",
    "var_pop",
    "var_samp",
    "array_agg",
    "string_agg",
    "group_concat",
    "listagg",
    "list",
    "any_value",
    "arbitrary",
    "first",
    "last",
    "bool_and",
    "bool_or",
    "bit_and",
    "bit_or",
    "every",
    "approx_count_distinct",
    "approx_distinct",
    "count_if",
    "countif",
    "sum_if",
    "percentile_cont",
    "percentile_disc",
    "quantile",
    "arg_max",
    "arg_min",
    "max_by",
    "min_by",
    "json_agg",
    "jsonb_agg",
    "object_agg",
    "hll",
];

/// Shape of the computation producing an expression's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// Unknown or unrecognized expression
    #[default]
    Unknown,
    /// Direct column reference (pass-through)
    Column,
    /// Contains an aggregate function
    Aggregate,
    /// Scalar function call
    Function,
    /// Window function (`... OVER (...)`)
    Window,
    /// Literal value
    Literal,
    /// Computed expression (binary op, unary op, etc.)
    Expression,
    /// CAST expression
    Cast,
    /// CASE expression
    Case,
    /// Scalar subquery
    Subquery,
    /// SELECT * or table.*
    Wildcard,
}

impl std::fmt::Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprKind::Unknown => write!(f, "unknown"),
            ExprKind::Column => write!(f, "column"),
            ExprKind::Aggregate => write!(f, "aggregate"),
            ExprKind::Function => write!(f, "function"),
            ExprKind::Window => write!(f, "window"),
            ExprKind::Literal => write!(f, "literal"),
            ExprKind::Expression => write!(f, "expression"),
            ExprKind::Cast => write!(f, "cast"),
            ExprKind::Case => write!(f, "case"),
            ExprKind::Subquery => write!(f, "subquery"),
            ExprKind::Wildcard => write!(f, "wildcard"),
        }
    }
}

/// Represents a column reference with its (unresolved) qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table name or alias the column was qualified with
    pub table: Option<String>,
    /// Column name (lower-cased)
    pub column: String,
}

impl ColumnRef {
    /// Create from a simple column name
    pub fn simple(column: &str) -> Self {
        Self {
            table: None,
            column: column.to_lowercase(),
        }
    }

    /// Create from table.column
    pub fn qualified(table: &str, column: &str) -> Self {
        Self {
            table: Some(table.to_lowercase()),
            column: column.to_lowercase(),
        }
    }

    /// `*` or `t.*`
    pub fn is_wildcard(&self) -> bool {
        self.column == "*"
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Lineage of one expression: what it reads and how
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExprLineage {
    /// Computation shape; `Aggregate` whenever an aggregate appears anywhere
    pub kind: ExprKind,
    /// Input columns in first-seen order, deduplicated
    pub sources: Vec<ColumnRef>,
    /// The expression rendered back to SQL
    pub sql: String,
}

impl ExprLineage {
    /// Lineage of a `*` / `t.*` projection item
    pub fn wildcard(qualifier: Option<&str>) -> Self {
        let source = match qualifier {
            Some(q) => ColumnRef::qualified(q, "*"),
            None => ColumnRef::simple("*"),
        };
        Self {
            kind: ExprKind::Wildcard,
            sources: vec![source],
            sql: match qualifier {
                Some(q) => format!("{q}.*"),
                None => "*".to_string(),
            },
        }
    }

    /// A bare column reference to exactly one input column
    pub fn is_bare_column(&self) -> bool {
        self.kind == ExprKind::Column && self.sources.len() == 1
    }
}

/// Accumulates sources while walking an expression tree
#[derive(Default)]
struct Collector {
    sources: Vec<ColumnRef>,
    aggregate: bool,
}

impl Collector {
    fn push(&mut self, col: ColumnRef) {
        if !self.sources.contains(&col) {
            self.sources.push(col);
        }
    }
}

/// Analyze an expression's column lineage
pub fn analyze_expr(expr: &Expr) -> ExprLineage {
    let mut collector = Collector::default();
    let kind = walk(expr, &mut collector);
    let kind = if collector.aggregate && kind != ExprKind::Window {
        ExprKind::Aggregate
    } else {
        kind
    };
    ExprLineage {
        kind,
        sources: collector.sources,
        sql: expr.to_string(),
    }
}

/// Collect every column referenced anywhere in an expression (including
/// predicates), without classifying it.
pub fn referenced_columns(expr: &Expr) -> Vec<ColumnRef> {
    let mut collector = Collector::default();
    walk(expr, &mut collector);
    collector.sources
}

/// Output name SQL engines give an unaliased expression
pub fn default_output_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => normalize_ident(ident),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(normalize_ident)
            .unwrap_or_else(|| expr.to_string().to_lowercase()),
        Expr::Nested(inner) => default_output_name(inner),
        Expr::Cast { expr, .. } => default_output_name(expr),
        _ => expr.to_string().to_lowercase(),
    }
}

/// Lower-cased identifier value
pub fn normalize_ident(ident: &Ident) -> String {
    ident.value.to_lowercase()
}

/// Dotted, lower-cased object name (`schema.table`)
pub fn object_name_to_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| match part.as_ident() {
            Some(ident) => normalize_ident(ident),
            None => part.to_string().to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn is_aggregate_name(name: &ObjectName) -> bool {
    let full = object_name_to_string(name);
    let last = full.rsplit('.').next().unwrap_or(&full);
    AGGREGATE_FUNCTIONS.contains(&last)
}

fn walk(expr: &Expr, c: &mut Collector) -> ExprKind {
    match expr {
        Expr::Identifier(ident) => {
            c.push(ColumnRef::simple(&ident.value));
            ExprKind::Column
        }
        Expr::CompoundIdentifier(idents) => {
            if idents.len() >= 2 {
                let column = idents.last().map(normalize_ident).unwrap_or_default();
                let table = idents[..idents.len() - 1]
                    .iter()
                    .map(normalize_ident)
                    .collect::<Vec<_>>()
                    .join(".");
                c.push(ColumnRef::qualified(&table, &column));
                ExprKind::Column
            } else {
                if let Some(ident) = idents.first() {
                    c.push(ColumnRef::simple(&ident.value));
                }
                ExprKind::Column
            }
        }
        Expr::Function(func) => {
            walk_function_args(&func.args, c);
            if func.over.is_some() {
                ExprKind::Window
            } else if is_aggregate_name(&func.name) {
                c.aggregate = true;
                ExprKind::Aggregate
            } else {
                ExprKind::Function
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            walk(left, c);
            walk(right, c);
            ExprKind::Expression
        }
        Expr::UnaryOp { expr, .. } => {
            walk(expr, c);
            ExprKind::Expression
        }
        Expr::Cast { expr, .. } => {
            walk(expr, c);
            ExprKind::Cast
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                walk(op, c);
            }
            for case_when in conditions {
                walk(&case_when.condition, c);
                walk(&case_when.result, c);
            }
            if let Some(else_expr) = else_result {
                walk(else_expr, c);
            }
            ExprKind::Case
        }
        // Columns inside a scalar subquery belong to the subquery's own
        // FROM scope; its relations are tracked structurally instead.
        Expr::Subquery(_) | Expr::Exists { .. } => ExprKind::Subquery,
        Expr::Nested(inner) => walk(inner, c),
        Expr::Value(..) | Expr::TypedString { .. } => ExprKind::Literal,
        Expr::IsNull(inner) | Expr::IsNotNull(inner) => {
            walk(inner, c);
            ExprKind::Expression
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk(expr, c);
            walk(low, c);
            walk(high, c);
            ExprKind::Expression
        }
        Expr::InList { expr, list, .. } => {
            walk(expr, c);
            for item in list {
                walk(item, c);
            }
            ExprKind::Expression
        }
        Expr::InSubquery { expr, .. } => {
            walk(expr, c);
            ExprKind::Expression
        }
        other => {
            walk_generic(other, c);
            ExprKind::Expression
        }
    }
}

/// Fallback for expression variants without a dedicated arm: visit every
/// nested expression and pick up identifiers and aggregate calls.
fn walk_generic(expr: &Expr, c: &mut Collector) {
    let _ = visit_expressions(expr, |e| {
        match e {
            Expr::Identifier(ident) => c.push(ColumnRef::simple(&ident.value)),
            Expr::CompoundIdentifier(idents) if idents.len() >= 2 => {
                let column = idents.last().map(normalize_ident).unwrap_or_default();
                let table = idents[..idents.len() - 1]
                    .iter()
                    .map(normalize_ident)
                    .collect::<Vec<_>>()
                    .join(".");
                c.push(ColumnRef::qualified(&table, &column));
            }
            Expr::Function(func) if func.over.is_none() && is_aggregate_name(&func.name) => {
                c.aggregate = true;
            }
            _ => {}
        }
        ControlFlow::<()>::Continue(())
    });
}

/// Extract column references from a single function argument expression.
///
/// `COUNT(*)` and `COUNT(t.*)` count rows; the wildcard reads no column.
fn walk_arg_expr(arg_expr: &FunctionArgExpr, c: &mut Collector) {
    match arg_expr {
        FunctionArgExpr::Expr(expr) => {
            walk(expr, c);
        }
        FunctionArgExpr::QualifiedWildcard(_) | FunctionArgExpr::Wildcard => {}
    }
}

/// Extract column references from function arguments
fn walk_function_args(args: &FunctionArguments, c: &mut Collector) {
    match args {
        FunctionArguments::List(arg_list) => {
            for arg in &arg_list.args {
                let arg_expr = match arg {
                    FunctionArg::Unnamed(e)
                    | FunctionArg::Named { arg: e, .. }
                    | FunctionArg::ExprNamed { arg: e, .. } => e,
                };
                walk_arg_expr(arg_expr, c);
            }
        }
        FunctionArguments::None | FunctionArguments::Subquery(_) => {}
    }
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
