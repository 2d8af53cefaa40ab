//! The seam between the bridge and a language model.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result};

/// Something that turns a system prompt and a user query into text.
///
/// A model asked to call a tool answers in the `ACTION: call_tool` format
/// described by [`crate::prompt::build_tool_prompt`].
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce a response for `query` under `system`.
    async fn complete(&self, system: &str, query: &str) -> Result<String>;

    /// Get the name of this model.
    fn name(&self) -> &str;
}

/// Treats the query itself as the model's answer.
///
/// Lets an operator type tool-call markers directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectModel;

#[async_trait]
impl ChatModel for DirectModel {
    async fn complete(&self, _system: &str, query: &str) -> Result<String> {
        Ok(query.to_string())
    }

    fn name(&self) -> &str {
        "direct"
    }
}

/// Model that replays canned responses, for testing.
#[derive(Debug)]
pub struct MockModel {
    responses: Mutex<Vec<String>>,
    request_log: Mutex<Vec<(String, String)>>,
}

impl MockModel {
    /// Create a mock model with the given responses, returned in order.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock model with a single response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    /// `(system, query)` pairs seen so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.request_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().map(|log| log.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn complete(&self, system: &str, query: &str) -> Result<String> {
        if let Ok(mut log) = self.request_log.lock() {
            log.push((system.to_string(), query.to_string()));
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| AgentError::model("mock model lock poisoned"))?;
        if responses.is_empty() {
            return Err(AgentError::model("no more mock responses"));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
