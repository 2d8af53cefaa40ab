//! Error types for MCP operations.

use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// No candidate host answered the reachability probe.
    #[error("MCP server unreachable: {0}")]
    Unreachable(String),

    /// A reply arrived but could not be decoded, or its id did not match.
    #[error("protocol decode error: {0}")]
    ProtocolDecode(String),

    /// Server returned a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    Rpc {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// A tool call failed on the server side.
    #[error("tool '{tool}' failed: {message}")]
    ToolFailed {
        /// Name of the tool that was invoked.
        tool: String,
        /// Server-provided error text.
        message: String,
    },

    /// Session has not completed the initialize handshake.
    #[error("MCP session not initialized - run bootstrap() first")]
    NotInitialized,

    /// Server no longer recognises our session id.
    #[error("MCP session expired")]
    SessionExpired,

    /// Non-success HTTP status from the MCP endpoint.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Failed to communicate with the MCP server.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Create an unreachable error.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }

    /// Create a protocol decode error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolDecode(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an RPC error from a server error object.
    pub fn rpc(code: i64, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data,
        }
    }

    /// Create a tool failure naming the tool.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether re-running the full session bootstrap may clear this error.
    pub fn is_recoverable_by_bootstrap(&self) -> bool {
        matches!(
            self,
            Self::Unreachable(_) | Self::NotInitialized | Self::SessionExpired
        )
    }

    /// Whether retrying the single request may succeed with the session intact.
    pub fn is_retryable_request(&self) -> bool {
        match self {
            Self::ProtocolDecode(_) | Self::Transport(_) | Self::Json(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this failure is final for the call that produced it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rpc { .. } | Self::ToolFailed { .. })
    }
}
