//! Configuration types.
//!
//! ```toml
//! [mcp]
//! webhook_url = "http://n8n:5678/webhook/abc123/chat"
//! host_override = "flows.lan:5678"
//! probe_timeout_secs = 5
//!
//! [mcp.headers]
//! Authorization = "Bearer ..."
//!
//! [bridge]
//! reply_limit = 4000
//!
//! [logging]
//! file = true
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Built-in defaults.
pub mod defaults {
    /// Well-known port of the workflow server.
    pub const MCP_PORT: u16 = 5678;

    /// Hosts probed when nothing else is configured. Same list as
    /// `flowlink_mcp::DEFAULT_PROBE_HOSTS`.
    pub const PROBE_HOSTS: &[&str] = &[
        "n8n",
        "localhost",
        "127.0.0.1",
        "host.docker.internal",
        "172.17.0.1",
    ];

    pub const PROBE_TIMEOUT_SECS: u64 = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const PROTOCOL_VERSION: &str = "2025-03-26";
    pub const CLIENT_NAME: &str = "flowlink";

    /// Longest reply handed back to the chat front end, in characters.
    pub const REPLY_LIMIT: usize = 4000;

    /// Words that mark a query as a request for workflow automation.
    pub const WORKFLOW_KEYWORDS: &[&str] = &[
        "workflow",
        "automation",
        "process",
        "trigger",
        "n8n",
        "run",
        "email",
        "calendar",
        "gmail",
        "send",
        "find",
        "create",
        "search",
    ];
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowlinkConfig {
    /// MCP connection settings.
    pub mcp: McpSettings,
    /// Chat routing settings.
    pub bridge: BridgeSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

impl FlowlinkConfig {
    /// Create an empty config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Check that the config can drive a session.
    pub fn validate(&self) -> Result<()> {
        self.mcp.validate()?;
        self.bridge.validate()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// How to find and talk to the MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    /// Webhook URL of the workflow; the MCP path is derived from it.
    pub webhook_url: Option<String>,
    /// Extra candidate (`host`, `host:port`, or URL), probed last.
    pub host_override: Option<String>,
    /// Port used for the default candidate hosts.
    pub port: u16,
    /// Candidate hosts, probed in order.
    pub probe_hosts: Vec<String>,
    /// Seconds allowed per reachability probe.
    pub probe_timeout_secs: u64,
    /// Seconds allowed per JSON-RPC round trip.
    pub request_timeout_secs: u64,
    /// Protocol version proposed during initialize.
    pub protocol_version: String,
    /// Client name sent during initialize.
    pub client_name: String,
    /// Extra HTTP headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            host_override: None,
            port: defaults::MCP_PORT,
            probe_hosts: defaults::PROBE_HOSTS.iter().map(|s| s.to_string()).collect(),
            probe_timeout_secs: defaults::PROBE_TIMEOUT_SECS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            protocol_version: defaults::PROTOCOL_VERSION.to_string(),
            client_name: defaults::CLIENT_NAME.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl McpSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured webhook URL, ignoring blank values.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Configured host override, ignoring blank values.
    pub fn host_override(&self) -> Option<&str> {
        self.host_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn validate(&self) -> Result<()> {
        if self.webhook_url().is_none() {
            return Err(ConfigError::missing(
                "mcp.webhook_url",
                "config (or set N8N_WEBHOOK_URL)",
            ));
        }
        if self.probe_hosts.is_empty() && self.host_override().is_none() {
            return Err(ConfigError::missing(
                "mcp.probe_hosts",
                "config (or set mcp.host_override)",
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("mcp.port", "must be non-zero"));
        }
        if self.probe_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "mcp timeouts",
                "must be at least one second",
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bridge Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Chat routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Longest reply, in characters.
    pub reply_limit: usize,
    /// Keywords that route a query to the workflow prompt.
    pub workflow_keywords: Vec<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            reply_limit: defaults::REPLY_LIMIT,
            workflow_keywords: defaults::WORKFLOW_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BridgeSettings {
    fn validate(&self) -> Result<()> {
        if self.reply_limit == 0 {
            return Err(ConfigError::invalid("bridge.reply_limit", "must be non-zero"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log file settings. Console output is controlled from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Write JSON logs to a daily rolling file.
    pub file: bool,
    /// Directory for log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: true,
            directory: None,
        }
    }
}
