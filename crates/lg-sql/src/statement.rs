//! Closed statement model consumed by the graph builder
//!
//! `lower_statement` turns a sqlparser AST into a small set of tagged
//! variants the builder understands. Anything else becomes
//! [`SqlStatement::Unsupported`] and contributes nothing to the graph.

use crate::expr::{
    analyze_expr, default_output_name, normalize_ident, object_name_to_string,
    referenced_columns, ColumnRef, ExprLineage,
};
use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    visit_relations, Join, JoinConstraint, JoinOperator, Query, Select, SelectItem,
    SelectItemQualifiedWildcardKind, SetExpr, Statement, TableFactor, TableObject,
    TableWithJoins, Visit, Visitor,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::ops::ControlFlow;

/// Statement kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    CreateView,
    CreateTable,
    Unsupported,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Merge => "merge",
            StatementKind::CreateView => "create_view",
            StatementKind::CreateTable => "create_table",
            StatementKind::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// A lowered SQL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SqlStatement {
    /// Bare query (no write target)
    Select(QueryShape),
    Insert(InsertShape),
    Update(MutationShape),
    Delete(MutationShape),
    Merge(MutationShape),
    CreateView(ViewShape),
    CreateTable(TableShape),
    /// Anything the builder does not model (DDL alterations, grants, ...)
    Unsupported { statement: String },
}

impl SqlStatement {
    /// Tag of this statement
    pub fn kind(&self) -> StatementKind {
        match self {
            SqlStatement::Select(_) => StatementKind::Select,
            SqlStatement::Insert(_) => StatementKind::Insert,
            SqlStatement::Update(_) => StatementKind::Update,
            SqlStatement::Delete(_) => StatementKind::Delete,
            SqlStatement::Merge(_) => StatementKind::Merge,
            SqlStatement::CreateView(_) => StatementKind::CreateView,
            SqlStatement::CreateTable(_) => StatementKind::CreateTable,
            SqlStatement::Unsupported { .. } => StatementKind::Unsupported,
        }
    }

    /// Relation this statement writes or defines, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            SqlStatement::Insert(s) => Some(&s.target),
            SqlStatement::Update(s) | SqlStatement::Delete(s) | SqlStatement::Merge(s) => {
                Some(&s.target)
            }
            SqlStatement::CreateView(s) => Some(&s.name),
            SqlStatement::CreateTable(s) => Some(&s.name),
            SqlStatement::Select(_) | SqlStatement::Unsupported { .. } => None,
        }
    }
}

/// A query: CTEs, set-operation branches and subquery references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryShape {
    /// `WITH` definitions in declaration order
    pub ctes: Vec<CteShape>,
    /// `WITH RECURSIVE`
    pub recursive: bool,
    /// SELECT branches; output column names come from the first one
    pub branches: Vec<SelectShape>,
    /// Relations read only from expression subqueries (WHERE, HAVING, ...)
    pub nested_relations: Vec<String>,
}

impl QueryShape {
    /// Output column names (from the leftmost branch)
    pub fn output_columns(&self) -> Vec<String> {
        self.branches
            .first()
            .map(|b| b.projection.iter().map(|p| p.output.clone()).collect())
            .unwrap_or_default()
    }
}

/// One `name AS (query)` entry of a WITH clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CteShape {
    pub name: String,
    /// Explicit column aliases: `WITH x (a, b) AS (...)`
    pub columns: Vec<String>,
    pub query: QueryShape,
}

/// One SELECT block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectShape {
    /// FROM/JOIN relations, primary relation first
    pub relations: Vec<RelationShape>,
    pub projection: Vec<ProjectionItem>,
    /// Columns read by WHERE/HAVING
    pub filter_columns: Vec<ColumnRef>,
}

/// A FROM or JOIN entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationShape {
    pub source: RelationSource,
    pub alias: Option<String>,
    /// `None` for the primary relation of a FROM item
    pub join: Option<JoinShape>,
}

impl RelationShape {
    /// Name this relation is addressed by inside the query
    pub fn binding_name(&self) -> Option<&str> {
        match (&self.alias, &self.source) {
            (Some(alias), _) => Some(alias),
            (None, RelationSource::Named(name)) => Some(name),
            (None, RelationSource::Derived(_)) => None,
        }
    }
}

/// What a relation reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationSource {
    /// A table, view, CTE or external object
    Named(String),
    /// Inline subquery: `FROM (SELECT ...) alias`
    Derived(Box<QueryShape>),
}

/// Join information carried by a non-primary relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinShape {
    pub kind: JoinKind,
    /// Predicate rendered back to SQL
    pub condition: Option<String>,
    /// Columns read by the predicate
    pub columns: Vec<ColumnRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Other,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Full => "full",
            JoinKind::Cross => "cross",
            JoinKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// One SELECT-list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionItem {
    /// Output column name (alias, or the engine's default name)
    pub output: String,
    /// Whether the name came from an explicit `AS alias`
    pub explicit_alias: bool,
    pub lineage: ExprLineage,
}

/// `INSERT INTO target [(columns)] query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertShape {
    pub target: String,
    pub columns: Vec<String>,
    pub source: Option<QueryShape>,
}

/// UPDATE / DELETE / MERGE: one written relation plus everything it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationShape {
    pub target: String,
    pub reads: Vec<String>,
}

/// `CREATE [MATERIALIZED] VIEW name [(columns)] AS query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewShape {
    pub name: String,
    pub columns: Vec<String>,
    pub query: QueryShape,
    pub materialized: bool,
}

/// `CREATE TABLE name (columns)` or `CREATE TABLE name AS query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableShape {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Option<QueryShape>,
}

/// Lower a parsed statement into the closed statement model
pub fn lower_statement(stmt: &Statement) -> SqlStatement {
    match stmt {
        Statement::Query(query) => SqlStatement::Select(lower_query(query)),
        Statement::Insert(insert) => match &insert.table {
            TableObject::TableName(name) => SqlStatement::Insert(InsertShape {
                target: object_name_to_string(name),
                columns: insert.columns.iter().map(normalize_ident).collect(),
                source: insert.source.as_deref().map(lower_query),
            }),
            _ => unsupported(stmt),
        },
        Statement::CreateTable(create) => SqlStatement::CreateTable(TableShape {
            name: object_name_to_string(&create.name),
            columns: create
                .columns
                .iter()
                .map(|c| normalize_ident(&c.name))
                .collect(),
            query: create.query.as_deref().map(lower_query),
        }),
        Statement::CreateView { .. } => lower_create_view(stmt),
        Statement::Update { .. } => lower_mutation(stmt, SqlStatement::Update),
        Statement::Delete(_) => lower_mutation(stmt, SqlStatement::Delete),
        Statement::Merge { .. } => lower_mutation(stmt, SqlStatement::Merge),
        _ => unsupported(stmt),
    }
}

fn unsupported(stmt: &Statement) -> SqlStatement {
    let rendered = stmt.to_string();
    let statement = rendered
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    log::debug!("Statement '{}' contributes nothing to lineage", statement);
    SqlStatement::Unsupported { statement }
}

/// UPDATE/DELETE/MERGE all name their target relation first; every other
/// relation visited afterwards is read.
fn lower_mutation(stmt: &Statement, wrap: fn(MutationShape) -> SqlStatement) -> SqlStatement {
    let relations = collect_relations(stmt);
    let Some((target, rest)) = relations.split_first() else {
        return unsupported(stmt);
    };
    let mut reads: Vec<String> = Vec::new();
    for name in rest {
        if name != target && !reads.contains(name) {
            reads.push(name.clone());
        }
    }
    wrap(MutationShape {
        target: target.clone(),
        reads,
    })
}

/// Captures the outermost query of a statement
struct FirstQuery(Option<Query>);

impl Visitor for FirstQuery {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        self.0 = Some(query.clone());
        ControlFlow::Break(())
    }
}

fn lower_create_view(stmt: &Statement) -> SqlStatement {
    let mut first = FirstQuery(None);
    let _ = stmt.visit(&mut first);
    let header = scan_view_header(&stmt.to_string());
    match (header, first.0) {
        (Some(header), Some(query)) => SqlStatement::CreateView(ViewShape {
            name: header.name,
            columns: header.columns,
            query: lower_query(&query),
            materialized: header.materialized,
        }),
        _ => unsupported(stmt),
    }
}

/// Name and column list of a CREATE VIEW statement
#[derive(Debug, PartialEq)]
struct ViewHeader {
    name: String,
    columns: Vec<String>,
    materialized: bool,
}

/// Read the view header from the canonical rendering of a CREATE VIEW.
///
/// Dialects decorate CREATE VIEW with many optional keywords (SECURE,
/// TEMPORARY, RECURSIVE, IF NOT EXISTS before or after the name, ...);
/// scanning tokens up to the name and optional column list handles all of
/// them uniformly.
fn scan_view_header(sql: &str) -> Option<ViewHeader> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize().ok()?;
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    let view_pos = tokens
        .iter()
        .position(|t| matches!(t, Token::Word(w) if w.keyword == Keyword::VIEW))?;
    let materialized = tokens[..view_pos]
        .iter()
        .any(|t| matches!(t, Token::Word(w) if w.keyword == Keyword::MATERIALIZED));

    let mut pos = view_pos + 1;
    if is_keyword(tokens.get(pos), Keyword::IF)
        && is_keyword(tokens.get(pos + 1), Keyword::NOT)
        && is_keyword(tokens.get(pos + 2), Keyword::EXISTS)
    {
        pos += 3;
    }

    let mut parts = Vec::new();
    loop {
        match tokens.get(pos) {
            Some(Token::Word(w)) => parts.push(w.value.to_lowercase()),
            _ => break,
        }
        pos += 1;
        if matches!(tokens.get(pos), Some(Token::Period)) {
            pos += 1;
        } else {
            break;
        }
    }
    if parts.is_empty() {
        return None;
    }

    let mut columns = Vec::new();
    if matches!(tokens.get(pos), Some(Token::LParen)) {
        let mut depth = 0usize;
        let mut expect_name = true;
        for token in &tokens[pos..] {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Token::Comma if depth == 1 => expect_name = true,
                Token::Word(w) if depth == 1 && expect_name => {
                    columns.push(w.value.to_lowercase());
                    expect_name = false;
                }
                _ => {}
            }
        }
    }

    Some(ViewHeader {
        name: parts.join("."),
        columns,
        materialized,
    })
}

fn is_keyword(token: Option<&Token>, keyword: Keyword) -> bool {
    matches!(token, Some(Token::Word(w)) if w.keyword == keyword)
}

/// Lower a query (WITH clause plus body)
pub fn lower_query(query: &Query) -> QueryShape {
    let mut shape = QueryShape::default();

    if let Some(with) = &query.with {
        shape.recursive = with.recursive;
        for cte in &with.cte_tables {
            shape.ctes.push(CteShape {
                name: normalize_ident(&cte.alias.name),
                columns: cte
                    .alias
                    .columns
                    .iter()
                    .map(|c| normalize_ident(&c.name))
                    .collect(),
                query: lower_query(&cte.query),
            });
        }
    }

    lower_set_expr(&query.body, &mut shape);
    shape
}

fn lower_set_expr(set_expr: &SetExpr, shape: &mut QueryShape) {
    match set_expr {
        SetExpr::Select(select) => {
            let branch = lower_select(select, &mut shape.nested_relations);
            shape.branches.push(branch);
        }
        SetExpr::SetOperation { left, right, .. } => {
            lower_set_expr(left, shape);
            lower_set_expr(right, shape);
        }
        SetExpr::Query(inner) => {
            let inner = lower_query(inner);
            shape.ctes.extend(inner.ctes);
            shape.recursive |= inner.recursive;
            shape.branches.extend(inner.branches);
            push_unique(&mut shape.nested_relations, inner.nested_relations);
        }
        SetExpr::Values(values) => {
            let projection = values
                .rows
                .first()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .map(|(i, expr)| ProjectionItem {
                            output: format!("column{}", i + 1),
                            explicit_alias: false,
                            lineage: analyze_expr(expr),
                        })
                        .collect()
                })
                .unwrap_or_default();
            shape.branches.push(SelectShape {
                projection,
                ..SelectShape::default()
            });
        }
        _ => {}
    }
}

fn lower_select(select: &Select, nested: &mut Vec<String>) -> SelectShape {
    let mut shape = SelectShape::default();

    for table in &select.from {
        lower_table_with_joins(table, &mut shape.relations, nested);
    }

    for item in &select.projection {
        let projection = match item {
            SelectItem::UnnamedExpr(expr) => {
                push_unique(nested, collect_relations(expr));
                ProjectionItem {
                    output: default_output_name(expr),
                    explicit_alias: false,
                    lineage: analyze_expr(expr),
                }
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                push_unique(nested, collect_relations(expr));
                ProjectionItem {
                    output: normalize_ident(alias),
                    explicit_alias: true,
                    lineage: analyze_expr(expr),
                }
            }
            SelectItem::QualifiedWildcard(kind, _) => {
                let qualifier = match kind {
                    SelectItemQualifiedWildcardKind::ObjectName(name) => {
                        object_name_to_string(name)
                    }
                    SelectItemQualifiedWildcardKind::Expr(expr) => expr.to_string().to_lowercase(),
                };
                ProjectionItem {
                    output: "*".to_string(),
                    explicit_alias: false,
                    lineage: ExprLineage::wildcard(Some(&qualifier)),
                }
            }
            SelectItem::Wildcard(_) => ProjectionItem {
                output: "*".to_string(),
                explicit_alias: false,
                lineage: ExprLineage::wildcard(None),
            },
        };
        shape.projection.push(projection);
    }

    for expr in select.selection.iter().chain(select.having.iter()) {
        for col in referenced_columns(expr) {
            if !shape.filter_columns.contains(&col) {
                shape.filter_columns.push(col);
            }
        }
        push_unique(nested, collect_relations(expr));
    }

    shape
}

fn lower_table_with_joins(
    table: &TableWithJoins,
    relations: &mut Vec<RelationShape>,
    nested: &mut Vec<String>,
) {
    lower_table_factor(&table.relation, None, relations, nested);
    for join in &table.joins {
        let join_shape = lower_join(join, nested);
        lower_table_factor(&join.relation, Some(join_shape), relations, nested);
    }
}

fn lower_table_factor(
    factor: &TableFactor,
    join: Option<JoinShape>,
    relations: &mut Vec<RelationShape>,
    nested: &mut Vec<String>,
) {
    match factor {
        TableFactor::Table { name, alias, .. } => relations.push(RelationShape {
            source: RelationSource::Named(object_name_to_string(name)),
            alias: alias.as_ref().map(|a| normalize_ident(&a.name)),
            join,
        }),
        TableFactor::Derived {
            subquery, alias, ..
        } => relations.push(RelationShape {
            source: RelationSource::Derived(Box::new(lower_query(subquery))),
            alias: alias.as_ref().map(|a| normalize_ident(&a.name)),
            join,
        }),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            let start = relations.len();
            lower_table_with_joins(table_with_joins, relations, nested);
            // The nested group as a whole joins the outer FROM item
            if let (Some(join), Some(first)) = (join, relations.get_mut(start)) {
                first.join = Some(join);
            }
        }
        other => {
            // Table functions, UNNEST and friends: keep whatever they read
            for name in collect_relations(other) {
                relations.push(RelationShape {
                    source: RelationSource::Named(name),
                    alias: None,
                    join: join.clone(),
                });
            }
        }
    }
}

fn lower_join(join: &Join, nested: &mut Vec<String>) -> JoinShape {
    let (kind, constraint) = match &join.join_operator {
        JoinOperator::Join(c) | JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
        JoinOperator::Left(c) | JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
        JoinOperator::Right(c) | JoinOperator::RightOuter(c) => (JoinKind::Right, Some(c)),
        JoinOperator::FullOuter(c) => (JoinKind::Full, Some(c)),
        JoinOperator::CrossJoin(_) => (JoinKind::Cross, None),
        _ => (JoinKind::Other, None),
    };

    let (condition, columns) = match constraint {
        Some(JoinConstraint::On(expr)) => {
            push_unique(nested, collect_relations(expr));
            (Some(expr.to_string()), referenced_columns(expr))
        }
        Some(JoinConstraint::Using(names)) => {
            let columns: Vec<ColumnRef> = names
                .iter()
                .map(|n| ColumnRef::simple(&object_name_to_string(n)))
                .collect();
            let rendered = columns
                .iter()
                .map(|c| c.column.clone())
                .collect::<Vec<_>>()
                .join(", ");
            (Some(format!("USING ({rendered})")), columns)
        }
        _ => (None, Vec::new()),
    };

    JoinShape {
        kind,
        condition,
        columns,
    }
}

/// Every relation name referenced anywhere inside an AST node
pub fn collect_relations<V: Visit>(node: &V) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let _ = visit_relations(node, |relation| {
        let name = object_name_to_string(relation);
        if !names.contains(&name) {
            names.push(name);
        }
        ControlFlow::<()>::Continue(())
    });
    names
}

fn push_unique(into: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}

#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;
