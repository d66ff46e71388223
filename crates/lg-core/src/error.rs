//! Error types for lg-core

use thiserror::Error;

/// Core error type for lineagegraph
#[derive(Error, Debug)]
pub enum CoreError {
    /// L001: Configuration file not found
    #[error("[L001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// L002: Failed to parse configuration file
    #[error("[L002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// L003: Invalid configuration value
    #[error("[L003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// L004: IO error
    #[error("[L004] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// L005: IO error with file path context
    #[error("[L005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// L006: YAML parse error
    #[error("[L006] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// L007: JSON serialization/deserialization error
    #[error("[L007] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// L008: Workspace directory not found
    #[error("[L008] Workspace directory not found: {path}")]
    WorkspaceNotFound { path: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
