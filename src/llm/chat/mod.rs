pub mod openai;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ LlmConfig, LlmError };
use crate::models::chat::ChatMessage;
use self::openai::OpenAIChatClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
}

/// Upstream chat-completion backend.
///
/// The credential is passed per call so the proxy can refuse to call out at
/// all when it is missing.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
