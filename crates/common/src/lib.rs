//! Shared types for the Recipe AutoPub services
//!
//! Holds the pieces every crate in the workspace needs: a redacting wrapper
//! for API keys and the configuration error type.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
