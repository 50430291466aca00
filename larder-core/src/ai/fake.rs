//! Fake AI client for testing.
//!
//! Returns canned responses keyed by prompt name, so tests run without
//! network access or API costs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, Usage};

/// A canned outcome for one prompt.
#[derive(Debug, Clone)]
enum FakeReply {
    Content(String),
    Error(String),
}

/// A fake AI client for testing.
///
/// Responses are matched by exact prompt name. Unmatched prompts fall back to
/// the default response, or fail if none is set. Every request is recorded.
#[derive(Debug, Default)]
pub struct FakeAiClient {
    replies: RwLock<HashMap<String, FakeReply>>,
    default_reply: Option<FakeReply>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(String, ChatRequest)>>,
}

impl FakeAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `prompt_name` with `content`.
    pub fn with_response(prompt_name: &str, content: &str) -> Self {
        let client = Self::new();
        client.add_response(prompt_name, content);
        client
    }

    pub fn add_response(&self, prompt_name: &str, content: &str) {
        self.replies
            .write()
            .unwrap()
            .insert(prompt_name.to_string(), FakeReply::Content(content.to_string()));
    }

    /// Fail `prompt_name` with an API error.
    pub fn add_error(&self, prompt_name: &str, message: &str) {
        self.replies
            .write()
            .unwrap()
            .insert(prompt_name.to_string(), FakeReply::Error(message.to_string()));
    }

    pub fn with_default_response(mut self, content: &str) -> Self {
        self.default_reply = Some(FakeReply::Content(content.to_string()));
        self
    }

    /// Sleep before answering, for exercising timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All requests received so far, with their prompt names.
    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt_name.to_string(), request));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .read()
            .unwrap()
            .get(prompt_name)
            .cloned()
            .or_else(|| self.default_reply.clone());

        match reply {
            Some(FakeReply::Content(content)) => Ok(ChatResponse {
                content,
                usage: Usage::default(),
                cached: false,
            }),
            Some(FakeReply::Error(message)) => Err(AiError::Api(message)),
            None => Err(AiError::Api(format!(
                "FakeAiClient: no response configured for prompt {prompt_name}"
            ))),
        }
    }
}
