//! SQL dialect selection

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    BigQueryDialect, Dialect, DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

static GENERIC: GenericDialect = GenericDialect {};
static DUCKDB: DuckDbDialect = DuckDbDialect {};
static SNOWFLAKE: SnowflakeDialect = SnowflakeDialect {};
static POSTGRES: PostgreSqlDialect = PostgreSqlDialect {};
static MYSQL: MySqlDialect = MySqlDialect {};
static BIGQUERY: BigQueryDialect = BigQueryDialect {};
static SQLITE: SQLiteDialect = SQLiteDialect {};
static MSSQL: MsSqlDialect = MsSqlDialect {};

/// SQL dialects the parser boundary understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// ANSI-ish permissive dialect
    Generic,
    /// DuckDB (default)
    #[default]
    DuckDb,
    Snowflake,
    Postgres,
    MySql,
    BigQuery,
    Sqlite,
    MsSql,
}

impl SqlDialect {
    /// All supported dialects
    pub const ALL: [SqlDialect; 8] = [
        SqlDialect::Generic,
        SqlDialect::DuckDb,
        SqlDialect::Snowflake,
        SqlDialect::Postgres,
        SqlDialect::MySql,
        SqlDialect::BigQuery,
        SqlDialect::Sqlite,
        SqlDialect::MsSql,
    ];

    /// Look up a dialect by name (case-insensitive, a few common aliases accepted)
    pub fn from_name(name: &str) -> SqlResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            "duckdb" => Ok(SqlDialect::DuckDb),
            "snowflake" => Ok(SqlDialect::Snowflake),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "bigquery" => Ok(SqlDialect::BigQuery),
            "sqlite" => Ok(SqlDialect::Sqlite),
            "mssql" | "tsql" | "sqlserver" => Ok(SqlDialect::MsSql),
            _ => Err(SqlError::UnknownDialect(name.to_string())),
        }
    }

    /// Get the underlying sqlparser dialect
    pub fn parser_dialect(&self) -> &'static dyn Dialect {
        match self {
            SqlDialect::Generic => &GENERIC,
            SqlDialect::DuckDb => &DUCKDB,
            SqlDialect::Snowflake => &SNOWFLAKE,
            SqlDialect::Postgres => &POSTGRES,
            SqlDialect::MySql => &MYSQL,
            SqlDialect::BigQuery => &BIGQUERY,
            SqlDialect::Sqlite => &SQLITE,
            SqlDialect::MsSql => &MSSQL,
        }
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let msg = e.to_string();
            // sqlparser reports "... at Line: X, Column: Y" inside the message
            let (line, column) = parse_location_from_error(&msg);
            SqlError::ParseError {
                message: msg,
                line,
                column,
            }
        })
    }

    /// Get the dialect name
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "generic",
            SqlDialect::DuckDb => "duckdb",
            SqlDialect::Snowflake => "snowflake",
            SqlDialect::Postgres => "postgres",
            SqlDialect::MySql => "mysql",
            SqlDialect::BigQuery => "bigquery",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MsSql => "mssql",
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse line and column from sqlparser error message.
///
/// `ParserError` is a plain string wrapper with no structured location data,
/// so "Line: N, Column: M" is recovered from the message text.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
