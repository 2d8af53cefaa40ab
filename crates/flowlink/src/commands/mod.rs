//! CLI command handlers.

pub mod ask;
pub mod call;
pub mod probe;
pub mod status;
pub mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use flowlink_agent::{Bridge, DirectModel};
use flowlink_config::{FlowlinkConfig, McpSettings};
use flowlink_mcp::{HttpTransport, HttpTransportConfig, McpSession, Prober, SessionConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Fully layered configuration.
    pub config: FlowlinkConfig,
    /// Config files that were loaded.
    pub config_sources: Vec<PathBuf>,
}

impl Context {
    /// Build a bridge from the configuration. Fails if the config cannot
    /// drive a session (e.g. no webhook URL).
    pub fn bridge(&self) -> Result<Bridge> {
        self.config
            .validate()
            .context("configuration is incomplete")?;

        let mcp = &self.config.mcp;
        let webhook = mcp.webhook_url().unwrap_or_default();
        let session_config = SessionConfig::from_webhook(webhook)
            .with_prober(prober(mcp))
            .with_protocol_version(mcp.protocol_version.clone())
            .with_client_info(mcp.client_name.clone(), env!("CARGO_PKG_VERSION"));

        let session = McpSession::connect_http(session_config, transport_config(mcp))?;
        Ok(Bridge::new(
            session,
            Arc::new(DirectModel),
            self.config.bridge.clone(),
        ))
    }

    /// HTTP transport alone, for commands that only probe.
    pub fn transport(&self) -> Result<HttpTransport> {
        Ok(HttpTransport::new(transport_config(&self.config.mcp))?)
    }

    /// Candidate hosts from the configuration.
    pub fn prober(&self) -> Prober {
        prober(&self.config.mcp)
    }
}

fn prober(mcp: &McpSettings) -> Prober {
    Prober::from_hosts(
        mcp.probe_hosts.iter().map(String::as_str),
        mcp.port,
        mcp.host_override(),
    )
}

fn transport_config(mcp: &McpSettings) -> HttpTransportConfig {
    mcp.headers.iter().fold(
        HttpTransportConfig::default()
            .with_timeout(mcp.request_timeout())
            .with_probe_timeout(mcp.probe_timeout()),
        |config, (key, value)| config.with_header(key.clone(), value.clone()),
    )
}
