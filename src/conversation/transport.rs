use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::Client as HttpClient;

use crate::models::proxy::{ ErrorKind, ProxyRequest, ProxyResponseBody, ProxyResult };
use crate::proxy::ProxyService;

/// How the controller reaches the proxy. Implementations must resolve every
/// call to a [`ProxyResult`] instead of failing.
#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn send(&self, request: &ProxyRequest) -> ProxyResult;
}

#[async_trait]
impl ProxyTransport for ProxyService {
    async fn send(&self, request: &ProxyRequest) -> ProxyResult {
        self.handle_message(request.clone()).await
    }
}

/// Talks to the proxy over HTTP, the way a browser page would.
pub struct HttpProxyTransport {
    http: HttpClient,
    endpoint: String,
}

impl HttpProxyTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn send(&self, request: &ProxyRequest) -> ProxyResult {
        let resp = match self.http.post(&self.endpoint).json(request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Chat proxy at {} unreachable: {}", self.endpoint, e);
                return ProxyResult::failure(500, ErrorKind::TransportError, e.to_string());
            }
        };

        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(body) => decode_reply(status, &body),
            Err(e) => {
                warn!("Failed to read chat proxy response: {}", e);
                ProxyResult::failure(500, ErrorKind::TransportError, e.to_string())
            }
        }
    }
}

/// Rebuilds a [`ProxyResult`] from the proxy's HTTP status and JSON body.
pub fn decode_reply(status: u16, body: &str) -> ProxyResult {
    let parsed = serde_json::from_str::<ProxyResponseBody>(body).ok();

    if (200..300).contains(&status) {
        return match parsed {
            Some(ProxyResponseBody::Reply { response }) if !response.trim().is_empty() =>
                ProxyResult::success(response),
            _ =>
                ProxyResult::failure(
                    500,
                    ErrorKind::UpstreamContractViolation,
                    "Reply body carries no response text"
                ),
        };
    }

    let (detail, code) = match parsed {
        Some(ProxyResponseBody::Error { error, code }) => (error, code),
        _ => (String::new(), None),
    };

    let kind = match code.as_deref().map(str::parse::<ErrorKind>) {
        Some(Ok(kind)) => kind,
        _ => {
            debug!("No structured error code in proxy reply; classifying status {}", status);
            classify_failure(status, &detail)
        }
    };

    ProxyResult::failure(status, kind, detail)
}

/// Fallback classification for replies without a usable `code`.
pub fn classify_failure(status: u16, detail: &str) -> ErrorKind {
    match status {
        400 => ErrorKind::InvalidInput,
        401 => ErrorKind::AuthFailed,
        405 => ErrorKind::MethodNotAllowed,
        429 => ErrorKind::RateLimited,
        _ => classify_detail(detail),
    }
}

/// Substring match over the error text. Fragile against upstream rewording,
/// which is why structured codes are consulted first.
pub fn classify_detail(detail: &str) -> ErrorKind {
    let lower = detail.to_lowercase();
    if lower.contains("api key") || lower.contains("credential") {
        ErrorKind::Misconfigured
    } else if lower.contains("insufficient_quota") || lower.contains("billing") || lower.contains("credits") {
        ErrorKind::QuotaExceeded
    } else if lower.contains("rate_limit") || lower.contains("rate limit") {
        ErrorKind::RateLimited
    } else {
        ErrorKind::UpstreamError
    }
}
