//! Endpoint construction and webhook path derivation.
//!
//! Everything here is pure: no network access, no panics. Malformed input is
//! passed through so that problems surface later as connection errors.

/// Scheme used when none is given.
pub const DEFAULT_SCHEME: &str = "http";

/// Well-known port of the workflow server's MCP endpoint.
pub const DEFAULT_MCP_PORT: u16 = 5678;

/// Path segments that introduce a routing identifier in a webhook URL.
const ROUTING_MARKERS: &[&str] = &["/mcp/", "/mcp-test/", "/webhook/", "/webhook-test/"];

/// One network location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Create an endpoint for `host` on the default scheme and port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: host.into(),
            port: DEFAULT_MCP_PORT,
            path: String::new(),
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the path. A leading `/` is added when missing.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = normalize_path(path);
        self
    }

    /// Set the scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Best-effort parse of `host`, `host:port`, or a full URL.
    ///
    /// Returns `None` only for blank input.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if text.contains("://")
            && let Ok(parsed) = url::Url::parse(text)
            && let Some(host) = parsed.host_str()
        {
            let path = match parsed.path() {
                "/" => "",
                p => p,
            };
            return Some(
                Self::new(host)
                    .with_scheme(parsed.scheme())
                    .with_port(parsed.port_or_known_default().unwrap_or(DEFAULT_MCP_PORT))
                    .with_path(path),
            );
        }

        // IPv6: `[addr]` or `[addr]:port`, and a bare address gets brackets.
        if text.starts_with('[') {
            if let Some((host, port)) = text.rsplit_once("]:")
                && let Ok(port) = port.parse::<u16>()
            {
                return Some(Self::new(format!("{}]", host)).with_port(port));
            }
            return Some(Self::new(text));
        }
        if text.matches(':').count() > 1 {
            return Some(Self::new(format!("[{}]", text)));
        }

        match text.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => match port.parse::<u16>() {
                Ok(port) => Some(Self::new(host).with_port(port)),
                Err(_) => Some(Self::new(text)),
            },
            _ => Some(Self::new(text)),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Render as `scheme://host:port/path`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

/// Build `http://host:port/path`. Never fails; fragments are used verbatim.
pub fn build_url(host: &str, port: u16, path: &str) -> String {
    format!(
        "{}://{}:{}{}",
        DEFAULT_SCHEME,
        host,
        port,
        normalize_path(path)
    )
}

/// Prefix `path` with `/` unless it is empty or already prefixed.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Paths derived from the configured webhook URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRoute {
    /// Path of the MCP endpoint, relative to the server base URL.
    pub mcp_path: String,
    /// Path of the plain webhook, unchanged from the configured URL.
    pub direct_webhook_path: String,
}

/// Derive the MCP endpoint path from a webhook URL.
///
/// With a routing marker (`/mcp/<id>/...`, `/webhook/<id>/...` and their
/// `-test` variants) the MCP path ends after `<id>`. Without one, both paths
/// are the URL's own path.
pub fn extract_mcp_path(webhook_url: &str) -> WebhookRoute {
    let path = webhook_path(webhook_url);

    let marker = ROUTING_MARKERS
        .iter()
        .filter_map(|m| path.find(m).map(|pos| (pos, *m)))
        .min_by_key(|(pos, _)| *pos);

    let mcp_path = match marker {
        Some((pos, marker)) => {
            let ident_start = pos + marker.len();
            let rest = &path[ident_start..];
            let ident_len = rest.find('/').unwrap_or(rest.len());
            if ident_len == 0 {
                path.clone()
            } else {
                path[..ident_start + ident_len].to_string()
            }
        }
        None => path.clone(),
    };

    WebhookRoute {
        mcp_path,
        direct_webhook_path: path,
    }
}

/// Path component of a URL, or the best guess at one for unparsable input.
fn webhook_path(webhook_url: &str) -> String {
    let trimmed = webhook_url.trim();
    if let Ok(parsed) = url::Url::parse(trimmed)
        && !parsed.cannot_be_a_base()
    {
        return parsed.path().to_string();
    }

    let without_query = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    match without_query.split_once("://") {
        Some((_, rest)) => rest
            .find('/')
            .map(|idx| rest[idx..].to_string())
            .unwrap_or_default(),
        None => without_query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_round_trip() {
        let cases = [
            ("n8n", 5678, "/mcp/abc123"),
            ("localhost", 8080, "/api/mcp"),
            ("127.0.0.1", 5678, "/webhook/x/y"),
            ("172.17.0.1", 1, "/"),
        ];
        for (host, port, path) in cases {
            let built = build_url(host, port, path);
            let parsed = url::Url::parse(&built).unwrap();
            assert_eq!(parsed.host_str(), Some(host), "{built}");
            assert_eq!(parsed.port_or_known_default(), Some(port), "{built}");
            assert_eq!(parsed.path(), path, "{built}");
        }
    }

    #[test]
    fn test_build_url_normalizes_path() {
        assert_eq!(build_url("n8n", 5678, "mcp/abc"), "http://n8n:5678/mcp/abc");
        assert_eq!(build_url("n8n", 5678, ""), "http://n8n:5678");
    }

    #[test]
    fn test_build_url_passes_garbage_through() {
        assert_eq!(build_url("not a host", 5678, "x y"), "http://not a host:5678/x y");
    }

    #[test]
    fn test_endpoint_defaults() {
        let ep = Endpoint::new("n8n");
        assert_eq!(ep.scheme(), "http");
        assert_eq!(ep.port(), DEFAULT_MCP_PORT);
        assert_eq!(ep.url(), "http://n8n:5678");

        let ep = Endpoint::new("n8n").with_path("api/mcp");
        assert_eq!(ep.path(), "/api/mcp");
    }

    #[test]
    fn test_endpoint_parse() {
        let ep = Endpoint::parse("workflows.internal:9000").unwrap();
        assert_eq!(ep.host(), "workflows.internal");
        assert_eq!(ep.port(), 9000);

        let ep = Endpoint::parse("workflows.internal").unwrap();
        assert_eq!(ep.port(), DEFAULT_MCP_PORT);

        let ep = Endpoint::parse("https://flows.example.com").unwrap();
        assert_eq!(ep.scheme(), "https");
        assert_eq!(ep.port(), 443);
        assert_eq!(ep.url(), "https://flows.example.com:443");

        let ep = Endpoint::parse("http://10.0.0.5:5678/").unwrap();
        assert_eq!(ep.url(), "http://10.0.0.5:5678");

        assert!(Endpoint::parse("   ").is_none());
    }

    #[test]
    fn test_endpoint_parse_ipv6() {
        let ep = Endpoint::parse("::1").unwrap();
        assert_eq!(ep.host(), "[::1]");
        assert_eq!(ep.port(), DEFAULT_MCP_PORT);
        assert_eq!(ep.url(), "http://[::1]:5678");

        let ep = Endpoint::parse("fe80::1:2").unwrap();
        assert_eq!(ep.host(), "[fe80::1:2]");

        let ep = Endpoint::parse("[::1]:9000").unwrap();
        assert_eq!(ep.host(), "[::1]");
        assert_eq!(ep.port(), 9000);

        let ep = Endpoint::parse("[::1]").unwrap();
        assert_eq!(ep.url(), "http://[::1]:5678");

        let ep = Endpoint::parse("http://[::1]:9000/").unwrap();
        assert_eq!(ep.url(), "http://[::1]:9000");
        assert!(url::Url::parse(&ep.url()).is_ok());
    }

    #[test]
    fn test_extract_with_marker_is_strict_prefix() {
        let route = extract_mcp_path("http://n8n:5678/mcp/abc123/sse");
        assert_eq!(route.mcp_path, "/mcp/abc123");
        assert_eq!(route.direct_webhook_path, "/mcp/abc123/sse");
        assert!(route.direct_webhook_path.starts_with(&route.mcp_path));
        assert!(route.mcp_path.len() < route.direct_webhook_path.len());

        let route = extract_mcp_path("https://flows.example.com/webhook-test/f00d/chat?x=1");
        assert_eq!(route.mcp_path, "/webhook-test/f00d");
        assert_eq!(route.direct_webhook_path, "/webhook-test/f00d/chat");

        let route = extract_mcp_path("http://n8n:5678/mcp-test/tools/messages");
        assert_eq!(route.mcp_path, "/mcp-test/tools");
    }

    #[test]
    fn test_extract_marker_at_end_keeps_paths_equal() {
        // The URL ends at the identifier, so nothing follows to strip.
        let route = extract_mcp_path("http://n8n:5678/mcp/abc123");
        assert_eq!(route.mcp_path, "/mcp/abc123");
        assert_eq!(route.direct_webhook_path, "/mcp/abc123");

        let route = extract_mcp_path("http://n8n:5678/webhook/f00d?debug=1");
        assert_eq!(route.mcp_path, route.direct_webhook_path);
        assert_eq!(route.mcp_path, "/webhook/f00d");
    }

    #[test]
    fn test_extract_without_marker() {
        let route = extract_mcp_path("http://n8n:5678/api/hooks/abc");
        assert_eq!(route.mcp_path, "/api/hooks/abc");
        assert_eq!(route.direct_webhook_path, "/api/hooks/abc");
    }

    #[test]
    fn test_extract_is_total() {
        for input in ["", "::::", "not a url", "http://", "mcp/", "/mcp/"] {
            let route = extract_mcp_path(input);
            assert!(route.direct_webhook_path.starts_with(&route.mcp_path));
        }
        let route = extract_mcp_path("not a url");
        assert_eq!(route.mcp_path, "not a url");
        assert_eq!(route.direct_webhook_path, "not a url");

        let route = extract_mcp_path("/mcp/");
        assert_eq!(route.mcp_path, "/mcp/");
    }
}
