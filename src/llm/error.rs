use thiserror::Error;

/// Failure raised by an upstream chat client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// The upstream answered with a non-2xx status.
    #[error("upstream returned status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        /// Machine-readable `error.code` (or `error.type`) from the upstream body.
        code: Option<String>,
    },
    /// No response at all: connect failure, timeout, broken body.
    #[error("{0}")]
    Transport(String),
    /// A 2xx response without an extractable reply.
    #[error("{0}")]
    Contract(String),
}

impl LlmError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        LlmError::Transport(err.to_string())
    }

    pub fn contract(message: impl Into<String>) -> Self {
        LlmError::Contract(message.into())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::transport(err)
    }
}
