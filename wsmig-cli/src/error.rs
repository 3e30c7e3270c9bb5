//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

use wsmig_migrate::{ApiError, MigrationError};

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(wsmig::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(wsmig::config),
        help("The config file needs `source` and `target` entries with `host` and `token`")
    )]
    Config(String),

    /// Workspace API error
    #[error("Workspace API error: {0}")]
    #[diagnostic(code(wsmig::api))]
    Api(String),

    /// Validation error
    #[error("Validation error: {0}")]
    #[diagnostic(code(wsmig::validation), help("Run `wsmig validate` for details"))]
    Validation(String),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(wsmig::migration))]
    Migration(String),

    /// Export error
    #[error("Export error: {0}")]
    #[diagnostic(code(wsmig::export))]
    Export(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Config(format!("Failed to parse JSON: {}", err))
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CliError::Api(err.to_string())
    }
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Io(e) => CliError::Io(e),
            MigrationError::Api(e) => e.into(),
            MigrationError::Export(msg) => CliError::Export(msg),
            other => CliError::Migration(other.to_string()),
        }
    }
}
