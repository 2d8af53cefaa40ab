//! Reachability probing across candidate hosts.
//!
//! The bridge may run inside a container network, directly on the host, or
//! against a remote server, so the right address is not known up front. The
//! prober walks an ordered candidate list and settles on the first host that
//! answers HTTP at all; the MCP endpoint itself may well reject a GET.

use crate::error::{McpError, Result};
use crate::resolver::{DEFAULT_MCP_PORT, Endpoint};
use crate::transport::McpTransport;

/// Hosts tried when nothing else is configured: the compose service name,
/// loopback, and the usual ways out of a container to its host.
pub const DEFAULT_PROBE_HOSTS: &[&str] = &[
    "n8n",
    "localhost",
    "127.0.0.1",
    "host.docker.internal",
    "172.17.0.1",
];

/// Ordered list of candidate base endpoints.
#[derive(Debug, Clone)]
pub struct Prober {
    candidates: Vec<Endpoint>,
}

impl Default for Prober {
    fn default() -> Self {
        Self::from_hosts(DEFAULT_PROBE_HOSTS.iter().copied(), DEFAULT_MCP_PORT, None)
    }
}

impl Prober {
    /// Probe exactly these endpoints, in order.
    pub fn new(candidates: Vec<Endpoint>) -> Self {
        Self { candidates }
    }

    /// Build candidates from host names sharing one port. An operator
    /// override (`host`, `host:port`, or a URL) is tried last.
    pub fn from_hosts<'a>(
        hosts: impl IntoIterator<Item = &'a str>,
        port: u16,
        host_override: Option<&str>,
    ) -> Self {
        let mut candidates: Vec<Endpoint> = hosts
            .into_iter()
            .map(|host| Endpoint::new(host).with_port(port))
            .collect();

        if let Some(endpoint) = host_override.and_then(Endpoint::parse)
            && !candidates.contains(&endpoint)
        {
            candidates.push(endpoint);
        }

        Self { candidates }
    }

    /// The candidates, in probing order.
    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    /// Return the base URL of the first candidate that answers.
    ///
    /// Stops at the first answer. When every candidate fails, the error names
    /// each one with its failure reason.
    pub async fn probe(&self, transport: &dyn McpTransport) -> Result<String> {
        if self.candidates.is_empty() {
            return Err(McpError::unreachable("no candidate hosts configured"));
        }

        let mut failures = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let base_url = candidate.url();
            tracing::debug!(url = %base_url, "probing MCP server");

            match transport.probe(&base_url).await {
                Ok(status) => {
                    tracing::info!(url = %base_url, status, "MCP server reachable");
                    return Ok(base_url);
                }
                Err(e) => {
                    tracing::debug!(url = %base_url, error = %e, "probe failed");
                    failures.push(format!("{} ({})", base_url, e));
                }
            }
        }

        Err(McpError::unreachable(format!(
            "no host answered: {}",
            failures.join("; ")
        )))
    }
}
