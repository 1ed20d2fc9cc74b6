//! Recording chat client for tests that must not touch the network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmError;
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub api_key: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Default)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: &str) -> Self {
        let client = Self::new();
        client.queue_reply(text);
        client
    }

    pub fn failing(err: LlmError) -> Self {
        let client = Self::new();
        client.queue_error(err);
        client
    }

    pub fn queue_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(CompletionResponse { response: text.to_string() }));
    }

    pub fn queue_error(&self, err: LlmError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            messages: messages.to_vec(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::transport("no mock reply queued")))
    }

    fn get_model(&self) -> String {
        "mock-model".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}
