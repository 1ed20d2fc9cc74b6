//! User-facing copy for every proxy outcome.

use crate::models::proxy::{ ErrorKind, ProxyResult, MESSAGE_REQUIRED, METHOD_NOT_ALLOWED };

pub const MISCONFIGURED_MESSAGE: &str = "API key error: please check the server configuration.";
pub const AUTH_FAILED_MESSAGE: &str = "API authentication failed. Please check the API key.";
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please wait a moment and try again.";
pub const QUOTA_EXCEEDED_MESSAGE: &str =
    "The account has run out of credits. Please check billing/usage.";
pub const UPSTREAM_ERROR_MESSAGE: &str = "Upstream service error. Please try again later.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on our side. Please try again.";
pub const TRANSPORT_ERROR_MESSAGE: &str = "I'm having trouble processing your request right now.";

pub fn user_facing_message(kind: ErrorKind, detail: &str) -> String {
    let message = match kind {
        ErrorKind::InvalidInput => MESSAGE_REQUIRED,
        ErrorKind::Misconfigured => MISCONFIGURED_MESSAGE,
        ErrorKind::AuthFailed => AUTH_FAILED_MESSAGE,
        ErrorKind::RateLimited => RATE_LIMITED_MESSAGE,
        ErrorKind::QuotaExceeded => QUOTA_EXCEEDED_MESSAGE,
        ErrorKind::UpstreamError => {
            let detail = detail.trim();
            if detail.is_empty() { UPSTREAM_ERROR_MESSAGE } else { detail }
        }
        ErrorKind::UpstreamContractViolation => INTERNAL_ERROR_MESSAGE,
        ErrorKind::TransportError => TRANSPORT_ERROR_MESSAGE,
        ErrorKind::MethodNotAllowed => METHOD_NOT_ALLOWED,
    };
    message.to_string()
}

/// Text of the assistant turn appended for `result`. Never empty.
pub fn reply_text(result: &ProxyResult) -> String {
    match result {
        ProxyResult::Success { text } if text.trim().is_empty() => INTERNAL_ERROR_MESSAGE.to_string(),
        ProxyResult::Success { text } => text.clone(),
        ProxyResult::Failure { kind, detail, .. } => user_facing_message(*kind, detail),
    }
}
