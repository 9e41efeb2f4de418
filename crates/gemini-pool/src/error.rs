//! Error types for the rotation manager

/// Errors from the rotation manager.
///
/// Rotation bookkeeping never fails; these are all deployment problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The active slot has no key configured. Fatal and not retriable: rotating
    /// away would hide a broken deployment behind the other keys.
    #[error("API key for slot {slot} is not configured ({name})")]
    Configuration { slot: usize, name: String },

    #[error("invalid pool settings: {0}")]
    InvalidPool(String),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
