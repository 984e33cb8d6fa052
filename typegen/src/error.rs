//! Error types for typegen

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for typegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to parse SQL schema: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid table pattern: {0}")]
    InvalidPattern(String),

    #[error("Generated output differs from {}:\n{diff}", .path.display())]
    VerifyMismatch { path: PathBuf, diff: String },
}

impl From<sqlparser::parser::ParserError> for CodegenError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        CodegenError::ParseError(err.to_string())
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        CodegenError::ConfigError(format!("Invalid JSON: {}", err))
    }
}

impl From<globset::Error> for CodegenError {
    fn from(err: globset::Error) -> Self {
        CodegenError::InvalidPattern(err.to_string())
    }
}

impl From<regex::Error> for CodegenError {
    fn from(err: regex::Error) -> Self {
        CodegenError::ConfigError(format!("Invalid regular expression: {}", err))
    }
}
