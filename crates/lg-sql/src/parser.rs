//! SQL parser wrapper

use crate::dialect::SqlDialect;
use crate::error::{SqlError, SqlResult};
use crate::statement::{lower_statement, SqlStatement};
use sqlparser::ast::Statement;

/// SQL parser that wraps sqlparser-rs with dialect support
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParser {
    dialect: SqlDialect,
}

impl SqlParser {
    /// Create a parser for the given dialect
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Create a new parser with DuckDB dialect
    pub fn duckdb() -> Self {
        Self::new(SqlDialect::DuckDb)
    }

    /// Create a parser from dialect name
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        SqlDialect::from_name(name).map(Self::new)
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql)
    }

    /// Parse SQL and lower every statement into the closed statement model.
    ///
    /// A file holding only comments or whitespace yields no statements
    /// rather than an error.
    pub fn parse_statements(&self, sql: &str) -> SqlResult<Vec<SqlStatement>> {
        match self.parse(sql) {
            Ok(stmts) => Ok(stmts.iter().map(lower_statement).collect()),
            Err(SqlError::EmptySql) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// The configured dialect
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
