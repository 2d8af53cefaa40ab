//! Error types for the chat bridge.

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type for bridge operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The language model could not produce a response.
    #[error("model error: {0}")]
    Model(String),

    /// MCP session or tool failure.
    #[error(transparent)]
    Mcp(#[from] flowlink_mcp::McpError),
}

impl AgentError {
    /// Create a model error.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}
