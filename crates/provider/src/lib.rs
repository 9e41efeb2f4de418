//! Provider-agnostic seams between the key rotation manager and its collaborators
//!
//! The rotation manager never talks to an upstream API itself. It consumes two
//! things from the outside world, both defined here:
//!
//! - A `CredentialSource` that resolves the key bound to a pool slot
//! - A `FailureDetail` describing what went wrong with an outbound call, which
//!   the classifier maps to a `FailureClass`
//!
//! Keeping these types in their own crate lets the HTTP client and the pool
//! depend on a shared vocabulary without depending on each other.

pub mod source;

pub use source::{EnvCredentialSource, StaticCredentialSource};

use common::Secret;
use serde::Serialize;

/// How a failed outbound call affects the slot that made it.
///
/// - RateLimit blacklists the slot and rotates immediately
/// - Generic counts toward the slot's error threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Provider rejected the call for quota or throughput reasons
    RateLimit,
    /// Anything else: 5xx, malformed request, timeout, connection reset
    Generic,
}

impl FailureClass {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FailureClass::RateLimit => "rate_limit",
            FailureClass::Generic => "generic",
        }
    }
}

/// What the caller observed when an outbound call failed.
///
/// `status` is the HTTP status when a response arrived; `message` is the
/// response body or transport error text. The caller's own error is never
/// wrapped, only described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub status: Option<u16>,
    pub message: String,
}

impl FailureDetail {
    /// Failure with an HTTP response.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }

    /// Failure before any response arrived (connect error, reset, etc.).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Outbound call exceeded its deadline.
    pub fn timeout() -> Self {
        Self::transport("request timed out")
    }
}

/// Resolves the credential bound to a 1-based pool slot.
///
/// Implementations must be cheap and non-blocking: `resolve` is called on every
/// `current_credential()` so that a fixed deployment is picked up without a
/// restart.
pub trait CredentialSource: Send + Sync {
    /// Credential for `slot`, or `None` when it is not configured.
    fn resolve(&self, slot: usize) -> Option<Secret<String>>;

    /// Human-readable name of the setting that backs `slot`, used in
    /// configuration errors (e.g. `GEMINI_API_KEY_3`).
    fn name(&self, slot: usize) -> String;
}
