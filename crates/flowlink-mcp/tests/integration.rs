//! Integration tests for the MCP client.
//!
//! These tests run the full protocol flow against a mock HTTP server.

use std::net::TcpListener;
use std::time::Duration;

use flowlink_mcp::{
    Endpoint, HttpTransportConfig, McpError, McpSession, Prober, SessionConfig, SessionState,
    invoker,
};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MCP_PATH: &str = "/mcp/test-flow";
const SESSION_ID: &str = "sess-4242";

fn sse(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Mcp-Session-Id", SESSION_ID)
        .set_body_raw(
            format!("event: message\ndata: {}\n\n", body).into_bytes(),
            "text/event-stream",
        )
}

/// Port that refuses connections: bound once, then released.
fn closed_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Endpoint::new("127.0.0.1").with_port(port)
}

fn endpoint_for(server: &MockServer) -> Endpoint {
    Endpoint::parse(&server.uri()).unwrap()
}

fn http_config() -> HttpTransportConfig {
    HttpTransportConfig::default()
        .with_timeout(Duration::from_secs(5))
        .with_probe_timeout(Duration::from_secs(2))
}

fn session_for(server: &MockServer) -> McpSession {
    let config = SessionConfig::new(MCP_PATH)
        .with_prober(Prober::new(vec![endpoint_for(server)]))
        .with_client_info("flowlink-test", "0.0.1");
    McpSession::connect_http(config, http_config()).unwrap()
}

/// Mount probe, initialize, initialized, and tools/list handlers.
async fn mount_handshake(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(405))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(sse(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "protocolVersion": "2025-03-26",
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": "mock-mcp-server", "version": "1.0.0"}
            }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "notifications/initialized"})))
        .and(header("Mcp-Session-Id", SESSION_ID))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .and(header("Mcp-Session-Id", SESSION_ID))
        .respond_with(sse(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"tools": [
                {
                    "name": "echo",
                    "description": "Echo the input text",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"text": {"type": "string"}},
                        "required": ["text"]
                    }
                },
                {"name": "get_weather", "description": "Current weather for a city"}
            ]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_probe_picks_first_answering_host() {
    let answering = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&answering)
        .await;

    let never_asked = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&never_asked)
        .await;

    let prober = Prober::new(vec![
        closed_endpoint(),
        endpoint_for(&answering),
        endpoint_for(&never_asked),
    ]);
    let transport = flowlink_mcp::HttpTransport::new(http_config()).unwrap();

    let base = prober.probe(&transport).await.unwrap();
    assert_eq!(base, endpoint_for(&answering).url());
}

#[tokio::test]
async fn test_probe_reports_every_failure() {
    let first = closed_endpoint();
    let second = closed_endpoint();
    let prober = Prober::new(vec![first.clone(), second.clone()]);
    let transport = flowlink_mcp::HttpTransport::new(http_config()).unwrap();

    let err = prober.probe(&transport).await.unwrap_err();
    assert!(matches!(err, McpError::Unreachable(_)));
    let msg = err.to_string();
    assert!(msg.contains(&first.url()));
    assert!(msg.contains(&second.url()));
}

#[tokio::test]
async fn test_full_session_and_tool_call() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({
            "method": "tools/call",
            "params": {"name": "echo", "arguments": {"text": "hi"}}
        })))
        .and(header("Mcp-Session-Id", SESSION_ID))
        .respond_with(sse(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {"content": [{"type": "text", "text": "hi"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let mut args = Map::new();
    args.insert("text".into(), json!("hi"));

    let output = invoker::call_tool(&mut session, "echo", args).await.unwrap();
    assert_eq!(output, "hi");

    assert_eq!(session.state(), SessionState::ToolsLoaded);
    assert_eq!(session.tool_names(), vec!["echo", "get_weather"]);
    assert_eq!(session.server_info().unwrap().name, "mock-mcp-server");
    assert_eq!(session.session_id(), Some(SESSION_ID));
    assert_eq!(
        session.find_tool("echo").unwrap().required_parameters(),
        vec!["text"]
    );

    // Request ids on the wire strictly increase; the notification has none.
    let requests = server.received_requests().await.unwrap();
    let ids: Vec<u64> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter_map(|v| v.get("id").and_then(Value::as_u64))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let init = requests
        .iter()
        .find(|r| {
            serde_json::from_slice::<Value>(&r.body)
                .map(|v| v["method"] == "initialize")
                .unwrap_or(false)
        })
        .unwrap();
    let accept = init.headers.get("accept").unwrap().to_str().unwrap();
    assert!(accept.contains("text/event-stream"));
    let body: Value = serde_json::from_slice(&init.body).unwrap();
    assert_eq!(body["params"]["clientInfo"]["name"], "flowlink-test");
}

#[tokio::test]
async fn test_tool_rpc_error_is_tool_failed() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(sse(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": -32602, "message": "Invalid params: city is required"}
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = invoker::call_tool(&mut session, "get_weather", Map::new())
        .await
        .unwrap_err();

    match err {
        McpError::ToolFailed { tool, message } => {
            assert_eq!(tool, "get_weather");
            assert!(message.contains("city is required"));
        }
        other => panic!("expected ToolFailed, got {other:?}"),
    }

    // The session itself is still usable.
    assert_eq!(session.state(), SessionState::ToolsLoaded);
}

#[tokio::test]
async fn test_bare_json_reply_is_accepted() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {"content": [], "structuredContent": {"temp_c": 31}}
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let output = invoker::call_tool(&mut session, "get_weather", Map::new())
        .await
        .unwrap();
    assert!(output.contains("\"temp_c\": 31"));
}

#[tokio::test]
async fn test_reply_with_wrong_id_is_rejected() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(sse(json!({
            "jsonrpc": "2.0",
            "id": 77,
            "result": {"content": [{"type": "text", "text": "not yours"}]}
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = invoker::call_tool(&mut session, "echo", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ProtocolDecode(_)));
}

#[tokio::test]
async fn test_expired_session_is_reported() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(MCP_PATH))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = invoker::call_tool(&mut session, "echo", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::SessionExpired));
    assert!(session.session_id().is_none());
}

#[tokio::test]
async fn test_unreachable_server_short_circuits() {
    let config = SessionConfig::new(MCP_PATH).with_prober(Prober::new(vec![closed_endpoint()]));
    let mut session = McpSession::connect_http(config, http_config()).unwrap();

    let err = session.bootstrap().await.unwrap_err();
    assert!(matches!(err, McpError::Unreachable(_)));
    assert_eq!(session.state(), SessionState::Unavailable);

    let text = invoker::call_tool_text(&mut session, "echo", Map::new()).await;
    assert!(text.contains("unreachable"));
}
