//! In-memory transport for unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{McpError, Result};
use crate::transport::{McpTransport, PostRequest, TransportReply};

/// Scripted transport: probes succeed only for listed URLs, POSTs pop queued
/// replies in order. Every call is counted.
#[derive(Default)]
pub struct StubTransport {
    reachable: HashSet<String>,
    replies: Mutex<VecDeque<TransportReply>>,
    posts: Mutex<Vec<(String, PostRequest)>>,
    probes: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `url` answer probes with 200.
    pub fn answering_probe(mut self, url: &str) -> Self {
        self.reachable.insert(url.to_string());
        self
    }

    pub fn push_reply(&self, reply: TransportReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn posts(&self) -> Vec<(String, PostRequest)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl McpTransport for StubTransport {
    async fn probe(&self, url: &str) -> Result<u16> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable.contains(url) {
            Ok(200)
        } else {
            Err(McpError::transport("connection refused"))
        }
    }

    async fn post(&self, url: &str, request: PostRequest) -> Result<TransportReply> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), request));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| McpError::transport("no scripted reply"))
    }
}
