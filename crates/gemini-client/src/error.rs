//! Error types for Gemini API calls

use provider::FailureDetail;

/// Errors from a single Gemini call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request never produced a response (connect, TLS, timeout).
    #[error("HTTP request failed: {message}")]
    Http { message: String, timeout: bool },

    /// Gemini answered with a non-2xx status.
    #[error("Gemini API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// 2xx response without candidate text.
    #[error("no content generated from Gemini")]
    EmptyResponse,

    /// Response or model text could not be decoded.
    #[error("could not parse Gemini response: {0}")]
    Parse(String),
}

impl Error {
    /// Description for the rotation manager. `None` for errors that happened
    /// after a successful call.
    pub fn failure_detail(&self) -> Option<FailureDetail> {
        match self {
            Error::Http { timeout: true, .. } => Some(FailureDetail::timeout()),
            Error::Http { message, .. } => Some(FailureDetail::transport(message.clone())),
            Error::Upstream { status, body } => Some(FailureDetail::http(*status, body.clone())),
            Error::EmptyResponse | Error::Parse(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http {
            timeout: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
