//! Query routing from chat text to MCP tools.
//!
//! [`Bridge::submit_query`] is the whole conversation turn: make sure the
//! session is ready, pick a prompt, ask the model, and either run the tool the
//! model named or hand back the model's text.

use std::sync::Arc;

use flowlink_config::BridgeSettings;
use flowlink_mcp::{McpSession, ServerInfo, SessionState, ToolInfo, invoker};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::classify::{QueryKind, classify_query};
use crate::error::Result;
use crate::intent::extract_tool_call;
use crate::model::ChatModel;
use crate::prompt::{GENERAL_PROMPT, build_tool_prompt};
use crate::reply::{format_error_reply, format_tool_reply, truncate};

/// Snapshot of the session for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub state: String,
    pub initialized: bool,
    pub base_url: Option<String>,
    pub endpoint_path: String,
    pub tool_count: usize,
    /// First characters of the session id.
    pub session_id_prefix: Option<String>,
    pub server: Option<ServerInfo>,
    pub model: String,
}

/// Connects a chat front end to one MCP session.
pub struct Bridge {
    session: Mutex<McpSession>,
    model: Arc<dyn ChatModel>,
    settings: BridgeSettings,
}

impl Bridge {
    pub fn new(session: McpSession, model: Arc<dyn ChatModel>, settings: BridgeSettings) -> Self {
        Self {
            session: Mutex::new(session),
            model,
            settings,
        }
    }

    /// Answer one user query. Always returns something to show the user.
    pub async fn submit_query(&self, text: &str) -> String {
        let query = text.trim();
        if query.is_empty() {
            return "Please send a question or a request.".to_string();
        }
        let limit = self.settings.reply_limit;

        let mut session = self.session.lock().await;
        if let Err(e) = ensure_ready(&mut session).await {
            tracing::error!(error = %e, "could not prepare MCP session");
            return format_error_reply(
                &format!("Could not connect to the workflow server: {}", e),
                limit,
            );
        }

        let kind = classify_query(query, &self.settings.workflow_keywords);
        tracing::info!(kind = %kind, "classified query");

        let system = match kind {
            QueryKind::Workflow => build_tool_prompt(session.tools()),
            QueryKind::General => GENERAL_PROMPT.to_string(),
        };
        // The model can be slow; don't hold the session meanwhile.
        drop(session);

        let response = match self.model.complete(&system, query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(model = %self.model.name(), error = %e, "model call failed");
                return format_error_reply("Error connecting to the language model.", limit);
            }
        };

        let intent = extract_tool_call(&response);
        match (intent.tool_name, kind) {
            (Some(tool), QueryKind::Workflow) => {
                let mut session = self.session.lock().await;
                match invoker::call_tool(&mut session, &tool, intent.arguments).await {
                    Ok(output) => format_tool_reply(&tool, &output, limit),
                    Err(e) => {
                        tracing::warn!(tool = %tool, error = %e, "tool call failed");
                        format_error_reply(&e.to_string(), limit)
                    }
                }
            }
            (Some(tool), QueryKind::General) => {
                tracing::debug!(tool = %tool, "ignoring tool call on a general query");
                truncate(&response, limit)
            }
            (None, _) => truncate(&response, limit),
        }
    }

    /// Bring the session to `ToolsLoaded`.
    pub async fn connect(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        Ok(ensure_ready(&mut session).await?)
    }

    /// Call a tool directly, bypassing the model.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String> {
        let mut session = self.session.lock().await;
        if session.state() == SessionState::Unavailable {
            session.reset();
        }
        Ok(invoker::call_tool(&mut session, name, arguments).await?)
    }

    /// Names of the tools the server advertised.
    pub async fn tool_names(&self) -> Vec<String> {
        self.session.lock().await.tool_names()
    }

    /// Tools the server advertised.
    pub async fn tools(&self) -> Vec<ToolInfo> {
        self.session.lock().await.tools().to_vec()
    }

    /// Find a reachable server without changing the session.
    pub async fn probe(&self) -> Result<String> {
        Ok(self.session.lock().await.probe().await?)
    }

    pub async fn status(&self) -> BridgeStatus {
        let session = self.session.lock().await;
        BridgeStatus {
            state: session.state().to_string(),
            initialized: session.is_initialized(),
            base_url: session.base_url().map(str::to_string),
            endpoint_path: session.mcp_path().to_string(),
            tool_count: session.tools().len(),
            session_id_prefix: session
                .session_id()
                .map(|id| id.chars().take(8).collect()),
            server: session.server_info().cloned(),
            model: self.model.name().to_string(),
        }
    }
}

/// Bootstrap, giving an unavailable session one fresh probe.
async fn ensure_ready(session: &mut McpSession) -> flowlink_mcp::Result<()> {
    match session.state() {
        SessionState::ToolsLoaded => return Ok(()),
        SessionState::Unavailable => {
            tracing::info!("retrying an unavailable MCP server");
            session.reset();
        }
        _ => {}
    }
    session.bootstrap().await
}
