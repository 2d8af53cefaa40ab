//! MCP (Model Context Protocol) client for flowlink.
//!
//! Talks to an MCP server exposed by a workflow automation host over the
//! streamable HTTP transport: JSON-RPC requests are POSTed, replies come back
//! as plain JSON or as Server-Sent Events.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  invoker                                                    │
//! │  - Bootstraps on demand, renders tools/call results         │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpSession                                                 │
//! │  - New → ConnectivityChecked → Initialized → ToolsLoaded    │
//! │  - Request ids, session id header, reply matching           │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//! ┌──────────────────────┐      ┌──────────────────────────────┐
//! │  Prober / resolver   │      │  McpTransport + codec        │
//! │  - Candidate hosts   │      │  - HTTP POST, SSE decoding   │
//! │  - Webhook → MCP path│      │                              │
//! └──────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use flowlink_mcp::{HttpTransportConfig, McpSession, SessionConfig, invoker};
//!
//! let config = SessionConfig::from_webhook("http://n8n:5678/webhook/abc123/chat");
//! let mut session = McpSession::connect_http(config, HttpTransportConfig::default())?;
//!
//! session.bootstrap().await?;
//! for tool in session.tools() {
//!     println!("Tool: {} - {:?}", tool.name, tool.description);
//! }
//!
//! let mut args = serde_json::Map::new();
//! args.insert("city".into(), "Kuala Lumpur".into());
//! let text = invoker::call_tool(&mut session, "get_weather", args).await?;
//! println!("{text}");
//! ```
//!
//! # Protocol flow
//!
//! 1. Probe candidate hosts; the first that answers HTTP is used
//! 2. Client sends `initialize` with capabilities
//! 3. Server responds with its capabilities (and maybe an `Mcp-Session-Id`)
//! 4. Client sends `notifications/initialized`
//! 5. Client calls `tools/list`, then `tools/call` as needed

pub mod codec;
pub mod error;
pub mod invoker;
pub mod probe;
pub mod protocol;
pub mod resolver;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types
pub use error::{McpError, Result};
pub use probe::{DEFAULT_PROBE_HOSTS, Prober};
pub use protocol::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, ListToolsResult,
    RequestId, ServerCapabilities, ServerInfo, ToolContent, ToolInfo, ToolsCapability,
};
pub use resolver::{DEFAULT_MCP_PORT, Endpoint, WebhookRoute, build_url, extract_mcp_path};
pub use session::{McpSession, SessionConfig, SessionState};
pub use transport::{
    HttpTransport, HttpTransportConfig, McpTransport, PostRequest, TransportReply,
};
