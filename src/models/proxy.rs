use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const CREDENTIAL_MISSING: &str = "credential not configured";

/// Body of an inbound proxy call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub message: String,
}

impl ProxyRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Failure classes shared by the proxy and the conversation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Misconfigured,
    AuthFailed,
    RateLimited,
    /// Upstream error caused by an exhausted account balance.
    QuotaExceeded,
    UpstreamError,
    UpstreamContractViolation,
    TransportError,
    MethodNotAllowed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Misconfigured => "misconfigured",
            ErrorKind::AuthFailed => "auth_failed",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::UpstreamContractViolation => "upstream_contract_violation",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseErrorKindError {
    message: String,
}

impl fmt::Display for ParseErrorKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseErrorKindError {}

impl FromStr for ErrorKind {
    type Err = ParseErrorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invalid_input" => Ok(ErrorKind::InvalidInput),
            "misconfigured" => Ok(ErrorKind::Misconfigured),
            "auth_failed" => Ok(ErrorKind::AuthFailed),
            "rate_limited" => Ok(ErrorKind::RateLimited),
            "quota_exceeded" => Ok(ErrorKind::QuotaExceeded),
            "upstream_error" => Ok(ErrorKind::UpstreamError),
            "upstream_contract_violation" => Ok(ErrorKind::UpstreamContractViolation),
            "transport_error" => Ok(ErrorKind::TransportError),
            "method_not_allowed" => Ok(ErrorKind::MethodNotAllowed),
            _ =>
                Err(ParseErrorKindError {
                    message: format!("Invalid error kind: '{}'", s),
                }),
        }
    }
}

/// Normalized outcome of one proxy call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyResult {
    Success {
        text: String,
    },
    Failure {
        http_status: u16,
        kind: ErrorKind,
        detail: String,
    },
}

impl ProxyResult {
    pub fn success(text: impl Into<String>) -> Self {
        ProxyResult::Success { text: text.into() }
    }

    pub fn failure(http_status: u16, kind: ErrorKind, detail: impl Into<String>) -> Self {
        ProxyResult::Failure { http_status, kind, detail: detail.into() }
    }

    pub fn method_not_allowed() -> Self {
        Self::failure(405, ErrorKind::MethodNotAllowed, METHOD_NOT_ALLOWED)
    }

    pub fn misconfigured() -> Self {
        Self::failure(500, ErrorKind::Misconfigured, CREDENTIAL_MISSING)
    }

    pub fn invalid_input() -> Self {
        Self::failure(400, ErrorKind::InvalidInput, MESSAGE_REQUIRED)
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ProxyResult::Success { .. } => 200,
            ProxyResult::Failure { http_status, .. } => *http_status,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ProxyResult::Success { .. } => None,
            ProxyResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProxyResult::Success { .. })
    }

    /// JSON body sent back to the browser.
    pub fn to_body(&self) -> ProxyResponseBody {
        match self {
            ProxyResult::Success { text } => ProxyResponseBody::Reply { response: text.clone() },
            ProxyResult::Failure { kind, detail, .. } =>
                ProxyResponseBody::Error {
                    error: detail.clone(),
                    code: Some(kind.as_str().to_string()),
                },
        }
    }
}

/// Wire shape of the proxy response: `{ "response" }` or `{ "error", "code" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyResponseBody {
    Reply {
        response: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}
