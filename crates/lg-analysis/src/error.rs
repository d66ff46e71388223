//! Error types for lg-analysis

use thiserror::Error;

/// Query error type
///
/// These never cross the request boundary as failures: the protocol layer
/// turns them into `{"error": ...}` responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Q001: No node with this id
    #[error("[Q001] Node '{id}' not found")]
    NodeNotFound { id: String },

    /// Q002: No entity of this type and name
    #[error("[Q002] {entity_type} '{name}' not found")]
    EntityNotFound { entity_type: String, name: String },

    /// Q003: Node exists but the column does not
    #[error("[Q003] Column '{column}' not found on '{node_id}'")]
    ColumnNotFound { node_id: String, column: String },

    /// Q004: Malformed or incomplete request
    #[error("[Q004] Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Result type alias for AnalysisError
pub type AnalysisResult<T> = Result<T, AnalysisError>;
