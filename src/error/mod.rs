//! Error types for agentrun.

use thiserror::Error;

use crate::types::Run;

/// Primary error type for all run orchestration operations.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Run {} failed: {}", .0.id, last_error_message(.0))]
    RunFailed(Box<Run>),

    #[error("Run {} was cancelled", .0.id)]
    RunCancelled(Box<Run>),

    #[error("Run {} expired", .0.id)]
    RunExpired(Box<Run>),

    #[error("No output could be produced for tool call {call_id}: {source}")]
    UnresolvedToolCall {
        call_id: String,
        #[source]
        source: Box<RunError>,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unsupported tool call {call_id} of kind {kind}")]
    UnsupportedToolCall { call_id: String, kind: String },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Run execution aborted by caller")]
    Aborted,

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The remote run reached a non-successful terminal status.
    RunOutcome,
    ToolResolution,
    Protocol,
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Aborted,
    Unknown,
}

impl RunError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Wrap a resolver failure for the given call.
    pub fn unresolved(call_id: impl Into<String>, source: RunError) -> Self {
        Self::UnresolvedToolCall {
            call_id: call_id.into(),
            source: Box::new(source),
        }
    }

    /// The terminal run carried by `RunFailed`, `RunCancelled` or `RunExpired`.
    pub fn terminal_run(&self) -> Option<&Run> {
        match self {
            Self::RunFailed(run) | Self::RunCancelled(run) | Self::RunExpired(run) => Some(run),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RunFailed(_) | Self::RunCancelled(_) | Self::RunExpired(_) => {
                ErrorCategory::RunOutcome
            }
            Self::UnresolvedToolCall { .. }
            | Self::UnknownTool(_)
            | Self::UnsupportedToolCall { .. }
            | Self::ToolExecution { .. } => ErrorCategory::ToolResolution,
            Self::ProtocolViolation(_) | Self::Stream(_) => ErrorCategory::Protocol,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Aborted => ErrorCategory::Aborted,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether a collaborator could reasonably retry the failed operation.
    ///
    /// The orchestrator itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

fn last_error_message(run: &Run) -> &str {
    run.last_error
        .as_ref()
        .map(|e| e.message.as_str())
        .unwrap_or("no error reported")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RunError>;
