//! lg-sql - SQL parsing layer for lineagegraph
//!
//! This crate wraps sqlparser-rs with dialect support and lowers its AST into
//! a closed statement model (SELECT, INSERT, UPDATE, DELETE, MERGE, CREATE
//! VIEW, CREATE TABLE) plus per-expression column lineage.

pub mod dialect;
pub mod error;
pub mod expr;
pub mod extractor;
pub mod parser;
pub mod statement;

pub use dialect::SqlDialect;
pub use error::{SqlError, SqlResult};
pub use expr::{analyze_expr, ColumnRef, ExprKind, ExprLineage};
pub use extractor::{extract_dependencies, last_segment};
pub use parser::SqlParser;
pub use statement::{
    lower_statement, CteShape, InsertShape, JoinKind, JoinShape, MutationShape, ProjectionItem,
    QueryShape, RelationShape, RelationSource, SelectShape, SqlStatement, StatementKind,
    TableShape, ViewShape,
};
