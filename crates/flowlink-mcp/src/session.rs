//! MCP session over the streamable HTTP transport.
//!
//! A [`McpSession`] owns one logical connection and walks it through
//!
//! ```text
//! New ──probe──▶ ConnectivityChecked ──initialize──▶ Initialized ──tools/list──▶ ToolsLoaded
//!  │
//!  └──probe failed──▶ Unavailable (every later call short-circuits until reset())
//! ```
//!
//! A failed `initialize` or `tools/list` leaves the state where it was so the
//! caller can retry that step. A 404 for a known session id drops back to
//! `ConnectivityChecked`, so the next bootstrap runs the handshake again.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::codec;
use crate::error::{McpError, Result};
use crate::probe::Prober;
use crate::protocol::{
    CallToolParams, ClientCapabilities, ClientInfo, InitializeParams, InitializeResult,
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, ListToolsResult, MCP_PROTOCOL_VERSION,
    ServerCapabilities, ServerInfo, ToolInfo,
};
use crate::resolver::extract_mcp_path;
use crate::transport::{
    HttpTransport, HttpTransportConfig, McpTransport, PostRequest, TransportReply,
};

/// Upper bound on `tools/list` pages followed in one load.
const MAX_TOOL_PAGES: usize = 64;

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    ConnectivityChecked,
    Initialized,
    ToolsLoaded,
    /// No candidate host answered. Terminal until [`McpSession::reset`].
    Unavailable,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::ConnectivityChecked => "connectivity checked",
            Self::Initialized => "initialized",
            Self::ToolsLoaded => "tools loaded",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Configuration for an MCP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path of the MCP endpoint relative to the probed base URL.
    pub mcp_path: String,
    /// Candidate hosts.
    pub prober: Prober,
    /// Protocol version proposed during initialize.
    pub protocol_version: String,
    /// Identity sent during initialize.
    pub client_info: ClientInfo,
}

impl SessionConfig {
    /// Create a config for an explicit MCP path.
    pub fn new(mcp_path: impl Into<String>) -> Self {
        Self {
            mcp_path: mcp_path.into(),
            prober: Prober::default(),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            client_info: ClientInfo::default(),
        }
    }

    /// Derive the MCP path from a configured webhook URL.
    pub fn from_webhook(webhook_url: &str) -> Self {
        Self::new(extract_mcp_path(webhook_url).mcp_path)
    }

    /// Set the candidate hosts.
    pub fn with_prober(mut self, prober: Prober) -> Self {
        self.prober = prober;
        self
    }

    /// Set the protocol version proposed during initialize.
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Set the client identity.
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = ClientInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }
}

/// A session with one MCP server.
///
/// Mutating methods take `&mut self`; share a session between tasks behind a
/// mutex.
pub struct McpSession {
    config: SessionConfig,
    transport: Arc<dyn McpTransport>,
    state: SessionState,
    /// Base URL chosen by the prober.
    base_url: Option<String>,
    /// Next request id. Never rewound, not even by `reset()`.
    next_id: u64,
    /// Server-assigned `Mcp-Session-Id`.
    session_id: Option<String>,
    /// Protocol version sent in headers; the server's answer wins.
    protocol_version: String,
    server_info: Option<ServerInfo>,
    capabilities: Option<ServerCapabilities>,
    instructions: Option<String>,
    tools: Vec<ToolInfo>,
}

impl McpSession {
    /// Create a session over the given transport. No I/O happens here.
    pub fn new(config: SessionConfig, transport: Arc<dyn McpTransport>) -> Self {
        let protocol_version = config.protocol_version.clone();
        Self {
            config,
            transport,
            state: SessionState::New,
            base_url: None,
            next_id: 1,
            session_id: None,
            protocol_version,
            server_info: None,
            capabilities: None,
            instructions: None,
            tools: Vec::new(),
        }
    }

    /// Create a session over HTTP.
    pub fn connect_http(config: SessionConfig, http: HttpTransportConfig) -> Result<Self> {
        let transport = HttpTransport::new(http)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the initialize handshake has completed.
    pub fn is_initialized(&self) -> bool {
        matches!(
            self.state,
            SessionState::Initialized | SessionState::ToolsLoaded
        )
    }

    /// Base URL chosen by the prober, once connectivity is checked.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// MCP endpoint path.
    pub fn mcp_path(&self) -> &str {
        &self.config.mcp_path
    }

    /// Full MCP endpoint URL, once connectivity is checked.
    pub fn endpoint_url(&self) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, self.config.mcp_path))
    }

    /// Server-assigned session id.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Protocol version currently in use.
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    pub fn capabilities(&self) -> Option<&ServerCapabilities> {
        self.capabilities.as_ref()
    }

    /// Usage instructions the server sent during initialize.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Tools loaded by the last `tools/list`.
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Names of the known tools, in server order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Look up a known tool by name.
    pub fn find_tool(&self, name: &str) -> Option<&ToolInfo> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Drop everything learned about the server and return to `New`.
    ///
    /// Request ids keep counting up.
    pub fn reset(&mut self) {
        tracing::info!(state = %self.state, "resetting MCP session");
        self.state = SessionState::New;
        self.base_url = None;
        self.session_id = None;
        self.protocol_version = self.config.protocol_version.clone();
        self.server_info = None;
        self.capabilities = None;
        self.instructions = None;
        self.tools.clear();
    }

    /// Drive the session from wherever it is to `ToolsLoaded`.
    pub async fn bootstrap(&mut self) -> Result<()> {
        loop {
            match self.state {
                SessionState::New => {
                    self.check_connectivity().await?;
                }
                SessionState::ConnectivityChecked => {
                    self.initialize().await?;
                }
                SessionState::Initialized => {
                    self.load_tools().await?;
                }
                SessionState::ToolsLoaded => return Ok(()),
                SessionState::Unavailable => return Err(self.unavailable_error()),
            }
        }
    }

    /// Probe candidate hosts without touching the session state.
    pub async fn probe(&self) -> Result<String> {
        self.config.prober.probe(self.transport.as_ref()).await
    }

    /// Probe candidate hosts and remember the first that answers.
    pub async fn check_connectivity(&mut self) -> Result<&str> {
        match self.state {
            SessionState::Unavailable => return Err(self.unavailable_error()),
            SessionState::New => {}
            _ => {
                return self.base_url.as_deref().ok_or(McpError::NotInitialized);
            }
        }

        match self.config.prober.probe(self.transport.as_ref()).await {
            Ok(base_url) => {
                tracing::info!(
                    base_url = %base_url,
                    mcp_path = %self.config.mcp_path,
                    "using MCP server"
                );
                self.state = SessionState::ConnectivityChecked;
                Ok(self.base_url.insert(base_url).as_str())
            }
            Err(e) => {
                tracing::error!(error = %e, "MCP server not reachable");
                self.state = SessionState::Unavailable;
                Err(e)
            }
        }
    }

    /// Perform the initialize handshake.
    ///
    /// Runs the connectivity check first if it has not happened yet. Any
    /// failure leaves the session in `ConnectivityChecked`.
    pub async fn initialize(&mut self) -> Result<&ServerInfo> {
        match self.state {
            SessionState::Unavailable => return Err(self.unavailable_error()),
            SessionState::New => {
                self.check_connectivity().await?;
            }
            SessionState::ConnectivityChecked => {}
            SessionState::Initialized | SessionState::ToolsLoaded => {
                return self.server_info.as_ref().ok_or(McpError::NotInitialized);
            }
        }

        let params = InitializeParams {
            protocol_version: self.config.protocol_version.clone(),
            capabilities: ClientCapabilities::default(),
            client_info: self.config.client_info.clone(),
        };

        tracing::info!("initializing MCP connection");
        let result = self
            .send_mcp_request("initialize", Some(serde_json::to_value(&params)?))
            .await?;

        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| McpError::protocol(format!("malformed initialize result: {}", e)))?;

        tracing::info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            protocol = %init.protocol_version,
            "MCP server initialized"
        );

        if init.protocol_version != self.protocol_version {
            tracing::debug!(
                proposed = %self.protocol_version,
                negotiated = %init.protocol_version,
                "server chose a different protocol version"
            );
            self.protocol_version = init.protocol_version;
        }

        if let Err(e) = self
            .send_notification("notifications/initialized", None)
            .await
        {
            tracing::warn!(error = %e, "initialized notification was not accepted");
        }

        self.capabilities = Some(init.capabilities);
        self.instructions = init.instructions;
        self.state = SessionState::Initialized;
        Ok(&*self.server_info.insert(init.server_info))
    }

    /// Fetch the tool list, following pagination cursors.
    ///
    /// An empty list is fine. A decode failure leaves the session in
    /// `Initialized`.
    pub async fn load_tools(&mut self) -> Result<&[ToolInfo]> {
        self.ensure_initialized()?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = cursor.take().map(|c| json!({ "cursor": c }));
            let result = self.send_mcp_request("tools/list", params).await?;
            let page: ListToolsResult = serde_json::from_value(result)
                .map_err(|e| McpError::protocol(format!("malformed tools/list result: {}", e)))?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        if cursor.is_some() {
            tracing::warn!(pages = MAX_TOOL_PAGES, "stopped following tools/list cursors");
        }

        tracing::info!(tool_count = tools.len(), "loaded MCP tools");
        for tool in &tools {
            tracing::debug!(
                tool = %tool.name,
                description = tool.description.as_deref().unwrap_or(""),
                parameters = ?tool.parameter_names(),
                required = ?tool.required_parameters(),
                "MCP tool"
            );
        }

        self.tools = tools;
        self.state = SessionState::ToolsLoaded;
        Ok(&self.tools)
    }

    /// Send `tools/call` and return the raw `result` value.
    ///
    /// Refuses without any I/O unless the handshake has completed.
    pub async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        self.ensure_initialized()?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.send_mcp_request("tools/call", Some(serde_json::to_value(&params)?))
            .await
    }

    /// Send a request and return its `result`, or the server's error.
    ///
    /// Every call uses a fresh id, and the reply is matched by id rather
    /// than by position in the response body.
    pub async fn send_mcp_request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let url = self.request_url()?;

        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, method, params);
        let body = serde_json::to_string(&request)?;

        tracing::debug!(id, method = %method, url = %url, "sending MCP request");

        let reply = self
            .transport
            .post(
                &url,
                PostRequest {
                    body,
                    session_id: self.session_id.clone(),
                    protocol_version: self.protocol_version.clone(),
                },
            )
            .await?;

        self.remember_session_id(reply.session_id.as_deref());

        if reply.status == 404 && self.session_id.is_some() {
            tracing::warn!(id, method = %method, "MCP session expired");
            self.expire_session();
            return Err(McpError::SessionExpired);
        }
        if !reply.is_success() {
            return Err(McpError::Http {
                status: reply.status,
                body: reply.body_excerpt(),
            });
        }

        let messages: Vec<JsonRpcMessage> = decode_frames(&reply)
            .into_iter()
            .flat_map(|frame| match frame {
                Value::Array(batch) => batch,
                other => vec![other],
            })
            .filter_map(JsonRpcMessage::from_value)
            .collect();

        if messages.is_empty() {
            return Err(if reply.body.trim().is_empty() {
                McpError::protocol(format!(
                    "empty response to {} (HTTP {})",
                    method, reply.status
                ))
            } else {
                McpError::protocol(format!(
                    "undecodable response to {}: {}",
                    method,
                    reply.body_excerpt()
                ))
            });
        }

        let mut other_ids = Vec::new();
        let mut unaddressed = None;
        for message in messages {
            match message.reply_id() {
                Some(reply_id) if reply_id.matches(id) => {
                    return finish_reply(message);
                }
                Some(reply_id) => other_ids.push(reply_id.to_string()),
                None if message.is_reply() => unaddressed = Some(message),
                None => {
                    tracing::debug!(?message, "ignoring server-initiated message");
                }
            }
        }

        // An error with a null id is the server failing to read our request.
        if let Some(message) = unaddressed {
            return finish_reply(message);
        }

        if other_ids.is_empty() {
            Err(McpError::protocol(format!(
                "no reply to request {} ({})",
                id, method
            )))
        } else {
            Err(McpError::protocol(format!(
                "response id mismatch: expected {}, got {}",
                id,
                other_ids.join(", ")
            )))
        }
    }

    /// Send a notification. Any 2xx status is success.
    pub async fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let url = self.request_url()?;
        let notification = JsonRpcNotification::new(method, params);

        let reply = self
            .transport
            .post(
                &url,
                PostRequest {
                    body: serde_json::to_string(&notification)?,
                    session_id: self.session_id.clone(),
                    protocol_version: self.protocol_version.clone(),
                },
            )
            .await?;

        self.remember_session_id(reply.session_id.as_deref());

        if reply.is_success() {
            tracing::debug!(method = %method, status = reply.status, "MCP notification accepted");
            Ok(())
        } else {
            Err(McpError::Http {
                status: reply.status,
                body: reply.body_excerpt(),
            })
        }
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn request_url(&self) -> Result<String> {
        if self.state == SessionState::Unavailable {
            return Err(self.unavailable_error());
        }
        self.endpoint_url().ok_or(McpError::NotInitialized)
    }

    fn ensure_initialized(&self) -> Result<()> {
        match self.state {
            SessionState::Unavailable => Err(self.unavailable_error()),
            _ if self.is_initialized() => Ok(()),
            _ => Err(McpError::NotInitialized),
        }
    }

    fn remember_session_id(&mut self, session_id: Option<&str>) {
        if let Some(sid) = session_id
            && self.session_id.as_deref() != Some(sid)
        {
            tracing::debug!(session = %sid.chars().take(8).collect::<String>(), "MCP session id assigned");
            self.session_id = Some(sid.to_string());
        }
    }

    /// Forget the handshake but keep the probed base URL, so the next
    /// bootstrap starts again at `initialize`.
    fn expire_session(&mut self) {
        self.session_id = None;
        self.protocol_version = self.config.protocol_version.clone();
        self.server_info = None;
        self.capabilities = None;
        self.instructions = None;
        self.tools.clear();
        if self.is_initialized() {
            self.state = SessionState::ConnectivityChecked;
        }
    }

    fn unavailable_error(&self) -> McpError {
        McpError::unreachable("server unreachable; reset the session to probe again")
    }
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("state", &self.state)
            .field("base_url", &self.base_url)
            .field("mcp_path", &self.config.mcp_path)
            .field("next_id", &self.next_id)
            .field("tools", &self.tools.len())
            .finish()
    }
}

/// Split a reply body into JSON payloads, by declared content type first.
fn decode_frames(reply: &TransportReply) -> Vec<Value> {
    if reply.is_event_stream() {
        return codec::parse_frames(&reply.body);
    }
    if codec::looks_like_sse(&reply.body) {
        tracing::debug!(
            content_type = ?reply.content_type,
            "SSE framing without an event-stream content type"
        );
        return codec::parse_frames(&reply.body);
    }
    codec::parse_frame(&reply.body).into_iter().collect()
}

fn finish_reply(message: JsonRpcMessage) -> Result<Value> {
    match message.into_result() {
        Some(Ok(result)) => Ok(result),
        Some(Err(error)) => Err(McpError::rpc(error.code, error.message, error.data)),
        None => Err(McpError::protocol("expected a reply, got a server message")),
    }
}
