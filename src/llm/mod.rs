pub mod chat;
pub mod error;

pub use error::LlmError;

use std::time::Duration;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    /// Whole-request timeout for the upstream call; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}
