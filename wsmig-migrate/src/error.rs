//! Error types for the migration engine.

use thiserror::Error;

/// Result type alias for workspace API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors returned by a workspace API call.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Unexpected response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decode error description.
        message: String,
    },

    /// The configured host is not a usable base URL.
    #[error("Invalid workspace host '{0}'")]
    InvalidHost(String),

    /// The configured token cannot be sent as a header value.
    #[error("Invalid workspace token: {0}")]
    InvalidToken(String),
}

impl ApiError {
    /// Create a transport error.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a status error.
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Check if the endpoint could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status code, if the endpoint answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that abort a whole pipeline, export or validation run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace API error that could not be degraded.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Backup could not be written; nothing was created on the target.
    #[error("Backup failed for {kind}: {message}")]
    Backup {
        /// Resource kind slug.
        kind: String,
        /// Failure description.
        message: String,
    },

    /// Every create call failed at the transport level.
    #[error("Workspace {host} is unreachable: {message}")]
    Unreachable {
        /// Target host.
        host: String,
        /// Last transport error.
        message: String,
    },

    /// Export error.
    #[error("Export error: {0}")]
    Export(String),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// General migration error.
    #[error("Migration error: {0}")]
    Other(String),
}

impl MigrationError {
    /// Create a backup error.
    pub fn backup(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backup {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an unreachable error.
    pub fn unreachable(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an export error.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create an other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this error happened before anything was written to the target.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(self, Self::Backup { .. } | Self::Io(_))
    }
}
