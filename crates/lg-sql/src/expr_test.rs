use super::*;
use crate::parser::SqlParser;
use sqlparser::ast::{SelectItem, SetExpr, Statement};

/// Parse `SELECT <expr> FROM t` and analyze the single projection item
fn lineage_of(expr_sql: &str) -> ExprLineage {
    let parser = SqlParser::duckdb();
    let sql = format!("SELECT {expr_sql} FROM t");
    let stmts = parser.parse(&sql).unwrap();
    let Statement::Query(query) = &stmts[0] else {
        panic!("expected a query");
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("expected a select");
    };
    match &select.projection[0] {
        SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
            analyze_expr(expr)
        }
        other => panic!("unexpected projection {other:?}"),
    }
}

#[test]
fn test_bare_column() {
    let lineage = lineage_of("id");
    assert_eq!(lineage.kind, ExprKind::Column);
    assert_eq!(lineage.sources, vec![ColumnRef::simple("id")]);
    assert!(lineage.is_bare_column());
}

#[test]
fn test_qualified_column_keeps_alias() {
    let lineage = lineage_of("o.Total");
    assert_eq!(lineage.sources, vec![ColumnRef::qualified("o", "total")]);
}

#[test]
fn test_aggregate_function() {
    let lineage = lineage_of("SUM(total)");
    assert_eq!(lineage.kind, ExprKind::Aggregate);
    assert_eq!(lineage.sources, vec![ColumnRef::simple("total")]);
    assert_eq!(lineage.sql, "SUM(total)");
}

#[test]
fn test_aggregate_nested_inside_scalar_function() {
    let lineage = lineage_of("ROUND(AVG(price), 2)");
    assert_eq!(lineage.kind, ExprKind::Aggregate);
    assert_eq!(lineage.sources, vec![ColumnRef::simple("price")]);
}

#[test]
fn test_count_star_reads_no_column() {
    let lineage = lineage_of("COUNT(*)");
    assert_eq!(lineage.kind, ExprKind::Aggregate);
    assert!(lineage.sources.is_empty());
}

#[test]
fn test_window_function_is_not_aggregate() {
    let lineage = lineage_of("SUM(amount) OVER (PARTITION BY customer_id)");
    assert_eq!(lineage.kind, ExprKind::Window);
    assert!(lineage.sources.contains(&ColumnRef::simple("amount")));
}

#[test]
fn test_scalar_function() {
    let lineage = lineage_of("UPPER(name)");
    assert_eq!(lineage.kind, ExprKind::Function);
}

#[test]
fn test_binary_expression_collects_both_sides() {
    let lineage = lineage_of("price * quantity");
    assert_eq!(lineage.kind, ExprKind::Expression);
    assert_eq!(
        lineage.sources,
        vec![ColumnRef::simple("price"), ColumnRef::simple("quantity")]
    );
}

#[test]
fn test_sources_are_deduplicated() {
    let lineage = lineage_of("price + price");
    assert_eq!(lineage.sources.len(), 1);
}

#[test]
fn test_case_expression() {
    let lineage = lineage_of("CASE WHEN status = 'active' THEN 1 ELSE 0 END");
    assert_eq!(lineage.kind, ExprKind::Case);
    assert_eq!(lineage.sources, vec![ColumnRef::simple("status")]);
}

#[test]
fn test_cast_expression() {
    let lineage = lineage_of("CAST(amount AS DECIMAL(10, 2))");
    assert_eq!(lineage.kind, ExprKind::Cast);
    assert_eq!(lineage.sources, vec![ColumnRef::simple("amount")]);
}

#[test]
fn test_literal() {
    let lineage = lineage_of("42");
    assert_eq!(lineage.kind, ExprKind::Literal);
    assert!(lineage.sources.is_empty());
}

#[test]
fn test_scalar_subquery_reads_no_outer_columns() {
    let lineage = lineage_of("(SELECT MAX(id) FROM other)");
    assert_eq!(lineage.kind, ExprKind::Subquery);
    assert!(lineage.sources.is_empty());
}

#[test]
fn test_default_output_name() {
    let parser = SqlParser::duckdb();
    let stmts = parser.parse("SELECT o.Total, amount FROM orders o").unwrap();
    let Statement::Query(query) = &stmts[0] else {
        panic!("expected a query");
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("expected a select");
    };
    let names: Vec<String> = select
        .projection
        .iter()
        .map(|item| match item {
            SelectItem::UnnamedExpr(expr) => default_output_name(expr),
            other => panic!("unexpected projection {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["total", "amount"]);
}
