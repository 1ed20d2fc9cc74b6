use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL };
use crate::models::chat::ChatMessage;

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIReplyMessage>,
}

#[derive(Deserialize)]
struct OpenAIReplyMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<std::time::Duration>
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.completion_model.clone(), config.base_url.clone(), config.timeout)
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }
}

/// Turns a raw upstream status and body into a reply or a classified error.
pub fn parse_completion(status: u16, body: &str) -> Result<CompletionResponse, LlmError> {
    if !(200..300).contains(&status) {
        let (message, code) = parse_error_body(body);
        return Err(LlmError::Status { status, message, code });
    }

    let parsed: OpenAIResponse = serde_json
        ::from_str(body)
        .map_err(|e| LlmError::contract(format!("Malformed completion body: {}", e)))?;

    let content = parsed.choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::contract("No choices in completion response"))?
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| LlmError::contract("First choice carries no message content"))?;

    Ok(CompletionResponse { response: content })
}

/// Extracts `(message, code)` from an upstream error body.
///
/// Accepts both `{"error": {"message", "code", "type"}}` and `{"error": "..."}`.
/// `code` falls back to `type` when the upstream leaves it null.
fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };

    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match value.get("error") {
        Some(message @ Value::String(_)) => (non_empty(Some(message)), None),
        Some(err @ Value::Object(_)) => {
            let message = non_empty(err.get("message"));
            let code = non_empty(err.get("code")).or_else(|| non_empty(err.get("type")));
            (message, code)
        }
        _ => (None, None),
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, LlmError> {
        let url = self.endpoint();
        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
        };

        let resp = self.http.post(&url).bearer_auth(api_key).json(&req).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!("OpenAI responded with status {} ({} bytes)", status, body.len());

        parse_completion(status, &body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
