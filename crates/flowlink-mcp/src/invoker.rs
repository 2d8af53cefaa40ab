//! Tool invocation on top of a session.
//!
//! Bootstraps the session when needed, sends `tools/call`, and renders the
//! result for a human reader.

use serde_json::{Map, Value};

use crate::error::{McpError, Result};
use crate::protocol::CallToolResult;
use crate::session::{McpSession, SessionState};

/// Invoke a tool and return its rendered output.
///
/// A session that has not reached `ToolsLoaded` is bootstrapped once first.
/// If the server has forgotten the session, the handshake is redone and the
/// call sent once more. Tools the server never advertised are still sent;
/// the server decides.
pub async fn call_tool(
    session: &mut McpSession,
    name: &str,
    arguments: Map<String, Value>,
) -> Result<String> {
    if session.state() != SessionState::ToolsLoaded {
        tracing::debug!(state = %session.state(), "bootstrapping session before tool call");
        session.bootstrap().await?;
    }

    if session.find_tool(name).is_none() {
        tracing::warn!(
            tool = %name,
            known = ?session.tool_names(),
            "calling a tool the server did not advertise"
        );
    }

    tracing::info!(tool = %name, "calling MCP tool");
    let shown = Value::Object(arguments.clone());
    tracing::debug!(tool = %name, arguments = %shown, "tool arguments");

    let outcome = match session.call_tool(name, arguments.clone()).await {
        Err(McpError::SessionExpired) => {
            tracing::info!(tool = %name, "re-initializing expired session");
            session.bootstrap().await?;
            session.call_tool(name, arguments).await
        }
        other => other,
    };

    let result = match outcome {
        Ok(result) => result,
        Err(McpError::Rpc { code, message, .. }) => {
            tracing::warn!(tool = %name, code, message = %message, "tool call rejected");
            return Err(McpError::tool_failed(
                name,
                format!("server error {}: {}", code, message),
            ));
        }
        Err(e) => return Err(e),
    };

    render_tool_result(name, &result)
}

/// Invoke a tool and always return a caller-facing string.
///
/// Failures become a readable message instead of an error.
pub async fn call_tool_text(
    session: &mut McpSession,
    name: &str,
    arguments: Map<String, Value>,
) -> String {
    match call_tool(session, name, arguments).await {
        Ok(text) => text,
        Err(e @ McpError::ToolFailed { .. }) => e.to_string(),
        Err(e) => format!("tool '{}' could not be called: {}", name, e),
    }
}

/// Render a `tools/call` result.
///
/// Text blocks are joined by newlines. A result with no text is shown as
/// pretty-printed JSON. A result flagged `isError` becomes
/// [`McpError::ToolFailed`].
pub fn render_tool_result(name: &str, result: &Value) -> Result<String> {
    let Ok(parsed) = serde_json::from_value::<CallToolResult>(result.clone()) else {
        return pretty(result);
    };

    if parsed.is_error() {
        let message = parsed
            .text()
            .unwrap_or_else(|| "tool reported an error".to_string());
        return Err(McpError::tool_failed(name, message));
    }

    match parsed.text() {
        Some(text) => Ok(text),
        None => pretty(result),
    }
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
