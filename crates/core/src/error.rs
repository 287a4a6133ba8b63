//! Error types for the docsmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Propagation policy: everything below the tool boundary is converted to a
//! structured `{success: false, error}` tool result; failures at or above
//! the agent runtime (provider transport, run-level errors) propagate to the
//! caller because the turn cannot complete.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all docsmith operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider failure, tagged with the backend that was in use.
    #[error("Provider '{provider}' error: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The agent kept requesting tools past the configured round cap.
    #[error("Too many tool rounds in one turn ({rounds}); aborting")]
    TooManyToolRounds { rounds: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a provider failure with the name of the backend in use.
    pub fn provider(provider: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            provider: provider.into(),
            source,
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The kind of filesystem operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Read,
    Write,
    List,
    Stat,
}

impl std::fmt::Display for FileOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::List => "list",
            Self::Stat => "stat",
        };
        write!(f, "{s}")
    }
}

/// Filesystem failures. Every unexpected I/O error is wrapped into a single
/// operation-tagged variant carrying the operation kind and the path.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File operation '{op}' failed for {path}: {reason}")]
    Operation {
        op: FileOp,
        path: PathBuf,
        reason: String,
    },
}

impl FileError {
    pub fn operation(op: FileOp, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Operation {
            op,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The operation kind this failure is tagged with.
    pub fn op(&self) -> FileOp {
        match self {
            Self::Operation { op, .. } => *op,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
