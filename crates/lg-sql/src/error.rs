//! Error types for lg-sql

use thiserror::Error;

/// SQL parsing errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL parse error (S001)
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL (S002)
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// Unsupported SQL statement (S003)
    #[error("[S003] Unsupported SQL statement type: {0}")]
    UnsupportedStatement(String),

    /// Unknown dialect name (S004)
    #[error("[S004] Unknown SQL dialect '{0}'")]
    UnknownDialect(String),
}

impl SqlError {
    /// Source location of the error, when the parser reported one
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SqlError::ParseError { line, column, .. } if *line > 0 => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
