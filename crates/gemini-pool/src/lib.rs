//! Key rotation for the Gemini content-generation API
//!
//! Manages a fixed pool of API key slots with reactive failover. Gemini's free
//! tier enforces per-key quotas with no way to read the remaining budget, so the
//! only usable signal is a failed call. The pool counts outcomes per slot and
//! moves the active slot when one stops working.
//!
//! Slot lifecycle:
//! 1. Process starts → every slot clean, slot 1 active
//! 2. Caller takes `current_credential()`, makes one call, reports the outcome
//! 3. Rate-limit failure → slot blacklisted, rotate to the next clean slot
//! 4. Generic failure at the error threshold → rotate without blacklisting
//! 5. Every slot blacklisted → full reset, counters zeroed, slot 1 active
//!
//! Nothing is persisted; a restart starts again at slot 1.

pub mod classify;
pub mod error;
pub mod pool;

pub use classify::classify_failure;
pub use error::{Error, Result};
pub use pool::{
    CredentialHandle, DEFAULT_ERROR_THRESHOLD, DEFAULT_POOL_SIZE, RotationManager,
    RotationReason, RotationStatus, SlotState,
};
