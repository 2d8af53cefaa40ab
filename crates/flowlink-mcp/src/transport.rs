//! Transport layer for MCP communication.
//!
//! MCP's streamable HTTP transport is a JSON-RPC message per POST. Replies
//! come back as `application/json` or `text/event-stream`; decoding is left to
//! [`crate::codec`]. The [`McpTransport`] trait is the seam the session talks
//! through, so tests can substitute a stub.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{McpError, Result};

/// Header carrying the server-assigned session id.
pub const SESSION_ID_HEADER: &str = "Mcp-Session-Id";

/// Header carrying the negotiated protocol version.
pub const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// Accept header value required by the streamable HTTP transport.
pub const ACCEPT_STREAMABLE: &str = "application/json, text/event-stream";

/// Longest body excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Configuration for HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Timeout for a JSON-RPC round trip.
    pub timeout: Duration,
    /// Timeout for a single reachability probe.
    pub probe_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Extra headers (e.g. authentication).
    pub headers: Vec<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            user_agent: format!("flowlink/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

impl HttpTransportConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// One outgoing JSON-RPC POST.
#[derive(Debug, Clone)]
pub struct PostRequest {
    /// Serialized JSON-RPC message.
    pub body: String,
    /// Session id from an earlier reply, if any.
    pub session_id: Option<String>,
    /// Protocol version negotiated (or proposed) for this session.
    pub protocol_version: String,
}

/// Raw reply to a POST, before frame decoding.
#[derive(Debug, Clone, Default)]
pub struct TransportReply {
    pub status: u16,
    pub content_type: Option<String>,
    /// `Mcp-Session-Id` response header.
    pub session_id: Option<String>,
    pub body: String,
}

impl TransportReply {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body is declared as an SSE stream.
    pub fn is_event_stream(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/event-stream"))
    }

    /// Short excerpt of the body for diagnostics.
    pub fn body_excerpt(&self) -> String {
        excerpt(&self.body, BODY_EXCERPT_LEN)
    }

    /// Attach a session id header.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Wire access to an MCP server.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Lightweight reachability check. Any HTTP answer counts: the status is
    /// returned, only transport-level failures are errors.
    async fn probe(&self, url: &str) -> Result<u16>;

    /// POST one JSON-RPC message and return the raw reply.
    async fn post(&self, url: &str, request: PostRequest) -> Result<TransportReply>;
}

/// HTTP transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Build the HTTP client.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            timeout_secs = config.timeout.as_secs(),
            probe_timeout_secs = config.probe_timeout.as_secs(),
            "created HTTP transport"
        );

        Ok(Self { client, config })
    }

    /// Transport configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn probe(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(|e| McpError::transport(describe_reqwest_error(&e, self.config.probe_timeout)))?;

        Ok(response.status().as_u16())
    }

    async fn post(&self, url: &str, request: PostRequest) -> Result<TransportReply> {
        tracing::trace!(url = %url, json = %request.body, "sending MCP HTTP request");

        let mut req = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, ACCEPT_STREAMABLE)
            .header(PROTOCOL_VERSION_HEADER, &request.protocol_version);

        if let Some(session_id) = &request.session_id {
            req = req.header(SESSION_ID_HEADER, session_id);
        }
        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req
            .body(request.body)
            .send()
            .await
            .map_err(|e| McpError::transport(describe_reqwest_error(&e, self.config.timeout)))?;

        let status = response.status().as_u16();
        let content_type = header_string(response.headers(), reqwest::header::CONTENT_TYPE.as_str());
        let session_id = header_string(response.headers(), SESSION_ID_HEADER);

        let body = response
            .text()
            .await
            .map_err(|e| McpError::transport(format!("failed to read response body: {}", e)))?;

        tracing::trace!(status, json = %body, "received MCP HTTP response");

        Ok(TransportReply {
            status,
            content_type,
            session_id,
            body,
        })
    }
}

fn header_string(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn describe_reqwest_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("HTTP request failed: {}", err)
    }
}

/// First `max` characters of `text`, cut on a char boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
