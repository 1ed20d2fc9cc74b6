use axum::extract::Request;
use axum::http::Method;
use log::{ debug, error, info, warn };
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::llm::chat::ChatClient;
use crate::llm::LlmError;
use crate::models::chat::ChatMessage;
use crate::models::proxy::{ ErrorKind, ProxyRequest, ProxyResult };

pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

pub const RATE_LIMIT_DETAIL: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub const AUTH_FAILED_DETAIL: &str = "API authentication failed. Please check your API key.";
pub const UPSTREAM_ERROR_DETAIL: &str = "Upstream service error. Please try again later.";
pub const REQUEST_FAILED_DETAIL: &str = "request failed";
pub const QUOTA_DETAIL: &str = "The upstream account has run out of credits.";

const QUOTA_CODE: &str = "insufficient_quota";

/// Stateless boundary between the browser and the upstream completion API.
///
/// Holds the credential, so nothing upstream-facing ever leaves the server.
/// Every path resolves to a [`ProxyResult`]; nothing is raised past `handle`.
#[derive(Clone)]
pub struct ProxyService {
    credential: Option<String>,
    chat_client: Arc<dyn ChatClient>,
    persona: Arc<str>,
    body_limit: usize,
}

impl ProxyService {
    pub fn new(
        credential: Option<String>,
        chat_client: Arc<dyn ChatClient>,
        persona: Arc<str>
    ) -> Self {
        let credential = credential.filter(|k| !k.trim().is_empty());

        if credential.is_some() {
            info!("Proxy configured with upstream credential.");
        } else {
            warn!("Proxy configured WITHOUT upstream credential. Every chat request will fail.");
        }

        Self {
            credential,
            chat_client,
            persona,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Handles one HTTP invocation. The body is read only after the method
    /// and credential checks pass.
    pub async fn handle(&self, request: Request) -> ProxyResult {
        let request_id = Uuid::new_v4();

        if request.method() != Method::POST {
            warn!("[{}] rejected {} request", request_id, request.method());
            return ProxyResult::method_not_allowed();
        }

        let Some(api_key) = self.credential.as_deref() else {
            error!("[{}] upstream credential is not configured", request_id);
            return ProxyResult::misconfigured();
        };

        let message = match axum::body::to_bytes(request.into_body(), self.body_limit).await {
            Ok(bytes) => extract_message(&bytes),
            Err(e) => {
                warn!("[{}] could not read request body: {}", request_id, e);
                None
            }
        };

        self.dispatch(request_id, api_key, message).await
    }

    /// In-process invocation with an already decoded request.
    pub async fn handle_message(&self, request: ProxyRequest) -> ProxyResult {
        let request_id = Uuid::new_v4();

        let Some(api_key) = self.credential.as_deref() else {
            error!("[{}] upstream credential is not configured", request_id);
            return ProxyResult::misconfigured();
        };

        self.dispatch(request_id, api_key, Some(request.message)).await
    }

    async fn dispatch(&self, request_id: Uuid, api_key: &str, message: Option<String>) -> ProxyResult {
        let Some(message) = message.filter(|m| !m.trim().is_empty()) else {
            debug!("[{}] rejected empty message", request_id);
            return ProxyResult::invalid_input();
        };

        info!(
            "[{}] forwarding message ({} chars) to model {}",
            request_id,
            message.chars().count(),
            self.chat_client.get_model()
        );

        let messages = [ChatMessage::system(&*self.persona), ChatMessage::user(message)];
        let result = match self.chat_client.complete(api_key, &messages).await {
            Ok(completion) => ProxyResult::success(completion.response),
            Err(e) => map_upstream_error(e),
        };

        match &result {
            ProxyResult::Success { text } => {
                info!("[{}] upstream replied ({} chars)", request_id, text.chars().count());
            }
            ProxyResult::Failure { http_status, kind, detail } => {
                warn!("[{}] upstream call failed: status={} kind={}", request_id, http_status, kind);
                debug!("[{}] upstream failure detail: {}", request_id, detail);
            }
        }

        result
    }
}

fn extract_message(body: &[u8]) -> Option<String> {
    serde_json
        ::from_slice::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Normalizes an upstream client failure.
///
/// 429, 401 and 500 always get their fixed copy. A structured quota code is
/// only consulted for the remaining statuses.
pub fn map_upstream_error(err: LlmError) -> ProxyResult {
    match err {
        LlmError::Status { status, message, code } =>
            match status {
                429 => ProxyResult::failure(status, ErrorKind::RateLimited, RATE_LIMIT_DETAIL),
                401 => ProxyResult::failure(status, ErrorKind::AuthFailed, AUTH_FAILED_DETAIL),
                500 => ProxyResult::failure(status, ErrorKind::UpstreamError, UPSTREAM_ERROR_DETAIL),
                _ if code.as_deref() == Some(QUOTA_CODE) => {
                    let detail = message.unwrap_or_else(|| QUOTA_DETAIL.to_string());
                    ProxyResult::failure(status, ErrorKind::QuotaExceeded, detail)
                }
                _ => {
                    let detail = message.unwrap_or_else(|| REQUEST_FAILED_DETAIL.to_string());
                    ProxyResult::failure(status, ErrorKind::UpstreamError, detail)
                }
            }
        LlmError::Transport(detail) => ProxyResult::failure(500, ErrorKind::TransportError, detail),
        LlmError::Contract(detail) =>
            ProxyResult::failure(500, ErrorKind::UpstreamContractViolation, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::testing::MockChatClient;
    use crate::models::chat::ChatRole;
    use axum::body::Body;

    fn service(credential: Option<&str>, client: Arc<MockChatClient>) -> ProxyService {
        ProxyService::new(credential.map(str::to_string), client, Arc::from("You are a test persona."))
    }

    fn post(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn status(code: u16, message: Option<&str>, err_code: Option<&str>) -> LlmError {
        LlmError::Status {
            status: code,
            message: message.map(str::to_string),
            code: err_code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn well_formed_reply_becomes_success() {
        let client = Arc::new(MockChatClient::replying("Hello!"));
        let proxy = service(Some("sk-test"), client.clone());

        let result = proxy.handle(post(r#"{"message":"hi"}"#)).await;
        assert_eq!(result, ProxyResult::success("Hello!"));

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "sk-test");
        assert_eq!(calls[0].messages, vec![
            ChatMessage::system("You are a test persona."),
            ChatMessage::user("hi"),
        ]);
    }

    #[tokio::test]
    async fn user_message_is_the_only_user_entry() {
        let client = Arc::new(MockChatClient::replying("ok"));
        let proxy = service(Some("sk-test"), client.clone());

        proxy.handle_message(ProxyRequest::new("  What is her tech stack?  ")).await;

        let messages = &client.calls()[0].messages;
        let users: Vec<_> = messages
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].content, "  What is her tech stack?  ");
        assert_eq!(messages[0].role, ChatRole::System);
    }

    #[tokio::test]
    async fn missing_credential_never_calls_upstream() {
        let client = Arc::new(MockChatClient::replying("unused"));
        let proxy = service(None, client.clone());

        let result = proxy.handle(post(r#"{"message":"hi"}"#)).await;
        assert_eq!(result.http_status(), 500);
        assert_eq!(result.kind(), Some(ErrorKind::Misconfigured));
        assert!(client.calls().is_empty());

        let result = proxy.handle_message(ProxyRequest::new("hi")).await;
        assert_eq!(result.kind(), Some(ErrorKind::Misconfigured));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_credential_counts_as_missing() {
        let client = Arc::new(MockChatClient::new());
        let proxy = service(Some("   "), client.clone());

        assert_eq!(proxy.handle_message(ProxyRequest::new("hi")).await, ProxyResult::misconfigured());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn credential_check_runs_before_input_validation() {
        let proxy = service(None, Arc::new(MockChatClient::new()));
        let result = proxy.handle(post(r#"{"message":"   "}"#)).await;
        assert_eq!(result.kind(), Some(ErrorKind::Misconfigured));
    }

    #[tokio::test]
    async fn empty_or_missing_message_is_rejected_without_upstream_call() {
        let client = Arc::new(MockChatClient::new());
        let proxy = service(Some("sk-test"), client.clone());

        for body in [r#"{"message":""}"#, r#"{"message":" \n\t "}"#, r#"{}"#, r#"{"message":42}"#, "not json", ""] {
            let result = proxy.handle(post(body)).await;
            assert_eq!(
                result,
                ProxyResult::failure(400, ErrorKind::InvalidInput, "Message is required"),
                "body: {body:?}"
            );
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn oversized_body_is_invalid_input() {
        let client = Arc::new(MockChatClient::new());
        let proxy = service(Some("sk-test"), client.clone()).with_body_limit(16);

        let result = proxy.handle(post(r#"{"message":"this body is far too long"}"#)).await;
        assert_eq!(result.kind(), Some(ErrorKind::InvalidInput));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn non_post_is_rejected_first() {
        let client = Arc::new(MockChatClient::new());
        let proxy = service(None, client.clone());

        for method in ["GET", "PUT", "DELETE", "OPTIONS"] {
            let request = axum::http::Request::builder()
                .method(method)
                .uri("/api/chat")
                .body(Body::from("{not even json"))
                .unwrap();
            let result = proxy.handle(request).await;
            assert_eq!(result, ProxyResult::failure(405, ErrorKind::MethodNotAllowed, "Method not allowed"));
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn upstream_failures_map_to_normalized_results() {
        let cases = [
            (status(429, Some("Rate limit reached for requests"), Some("rate_limit_exceeded")),
             ProxyResult::failure(429, ErrorKind::RateLimited, RATE_LIMIT_DETAIL)),
            (status(401, Some("Incorrect API key provided"), Some("invalid_api_key")),
             ProxyResult::failure(401, ErrorKind::AuthFailed, AUTH_FAILED_DETAIL)),
            (status(500, Some("The server had an error"), None),
             ProxyResult::failure(500, ErrorKind::UpstreamError, UPSTREAM_ERROR_DETAIL)),
            (status(404, Some("The model `gpt-9` does not exist"), Some("model_not_found")),
             ProxyResult::failure(404, ErrorKind::UpstreamError, "The model `gpt-9` does not exist")),
            (status(503, None, None),
             ProxyResult::failure(503, ErrorKind::UpstreamError, "request failed")),
            (status(429, Some("You exceeded your current quota"), Some("insufficient_quota")),
             ProxyResult::failure(429, ErrorKind::RateLimited, RATE_LIMIT_DETAIL)),
            (status(403, Some("You exceeded your current quota"), Some("insufficient_quota")),
             ProxyResult::failure(403, ErrorKind::QuotaExceeded, "You exceeded your current quota")),
            (status(402, None, Some("insufficient_quota")),
             ProxyResult::failure(402, ErrorKind::QuotaExceeded, QUOTA_DETAIL)),
            (LlmError::transport("error sending request: connection refused"),
             ProxyResult::failure(500, ErrorKind::TransportError, "error sending request: connection refused")),
            (LlmError::contract("No choices in completion response"),
             ProxyResult::failure(500, ErrorKind::UpstreamContractViolation, "No choices in completion response")),
        ];

        for (err, expected) in cases {
            let client = Arc::new(MockChatClient::failing(err));
            let proxy = service(Some("sk-test"), client.clone());
            assert_eq!(proxy.handle_message(ProxyRequest::new("hi")).await, expected);
            assert_eq!(client.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn invocations_share_no_state() {
        let client = Arc::new(MockChatClient::new());
        client.queue_reply("first");
        client.queue_reply("second");
        let proxy = service(Some("sk-test"), client.clone());

        let (a, b) = tokio::join!(
            proxy.handle_message(ProxyRequest::new("one")),
            proxy.handle_message(ProxyRequest::new("two"))
        );
        assert!(a.is_success() && b.is_success());
        for call in client.calls() {
            assert_eq!(call.messages.len(), 2);
        }
    }

    /// Keeps every record emitted while the test binary runs.
    struct RecordingLogger {
        records: std::sync::Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for RecordingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records.lock().unwrap().push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static LOGGER: std::sync::OnceLock<RecordingLogger> = std::sync::OnceLock::new();

    fn recording_logger() -> &'static RecordingLogger {
        let logger = LOGGER.get_or_init(|| RecordingLogger { records: std::sync::Mutex::new(Vec::new()) });
        let _ = log::set_logger(logger);
        log::set_max_level(log::LevelFilter::Debug);
        logger
    }

    #[tokio::test]
    async fn upstream_failure_detail_is_logged_at_debug_only() {
        let logger = recording_logger();
        let detail = "The model `persona-detail-marker` does not exist";
        let client = Arc::new(MockChatClient::failing(status(404, Some(detail), Some("model_not_found"))));
        let proxy = service(Some("sk-test"), client);

        let result = proxy.handle_message(ProxyRequest::new("hi")).await;
        assert_eq!(result.kind(), Some(ErrorKind::UpstreamError));

        let records = logger.records.lock().unwrap();
        let mentioning: Vec<_> = records
            .iter()
            .filter(|(_, text)| text.contains("persona-detail-marker"))
            .collect();
        assert!(!mentioning.is_empty());
        assert!(mentioning.iter().all(|(level, _)| *level == log::Level::Debug));
    }
}
