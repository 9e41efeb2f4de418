//! Slot state machine and forward-scan rotation
//!
//! The manager holds one `SlotState` per key slot and the index of the active
//! slot. Callers read the active credential, make exactly one outbound call,
//! and report the outcome. Reports are the only way state changes.
//!
//! All mutation happens under a single `Mutex`. The active index is mirrored in
//! an `AtomicUsize` that is only written while that lock is held, so
//! `current_credential()` never contends with reporters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use common::Secret;
use provider::{CredentialSource, FailureClass, FailureDetail};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::classify::classify_failure;
use crate::error::{Error, Result};

/// Number of key slots when not configured otherwise.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Generic failures on one slot before it is rotated out.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 5;

/// Usage and health counters for one key slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotState {
    /// 1-based slot identity, stable for the process lifetime
    pub slot_index: usize,
    /// Successful calls since the last full reset
    pub request_count: u64,
    /// Failed calls since the last full reset
    pub error_count: u32,
    /// Most recent reported attempt, success or failure
    pub last_used_at: DateTime<Utc>,
    /// Taken out of rotation until the next full reset
    pub rate_limit_reached: bool,
}

impl SlotState {
    fn new(slot_index: usize, now: DateTime<Utc>) -> Self {
        Self {
            slot_index,
            request_count: 0,
            error_count: 0,
            last_used_at: now,
            rate_limit_reached: false,
        }
    }

    fn clear(&mut self) {
        self.request_count = 0;
        self.error_count = 0;
        self.rate_limit_reached = false;
    }
}

/// Why a rotation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationReason {
    RateLimit,
    ErrorThreshold,
}

impl RotationReason {
    pub fn label(&self) -> &'static str {
        match self {
            RotationReason::RateLimit => "rate_limit",
            RotationReason::ErrorThreshold => "error_threshold",
        }
    }
}

/// The active slot's key, ready for one outbound call.
#[derive(Debug)]
pub struct CredentialHandle {
    pub slot: usize,
    pub key: Secret<String>,
}

/// Point-in-time copy of the pool for status endpoints. Never contains keys.
#[derive(Debug, Clone, Serialize)]
pub struct RotationStatus {
    pub current_slot: usize,
    pub pool_size: usize,
    pub error_threshold: u32,
    pub slots: Vec<SlotState>,
}

/// Rotating pool of API key slots.
///
/// Construct once at startup and share as `Arc<RotationManager>`.
pub struct RotationManager {
    slots: Mutex<Vec<SlotState>>,
    current: AtomicUsize,
    error_threshold: u32,
    source: Arc<dyn CredentialSource>,
}

impl RotationManager {
    /// Create a pool of `pool_size` clean slots with slot 1 active.
    ///
    /// Keys are not checked here; a missing key only matters once its slot
    /// becomes active.
    pub fn new(
        pool_size: usize,
        error_threshold: u32,
        source: Arc<dyn CredentialSource>,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::InvalidPool("pool_size must be at least 1".into()));
        }
        if error_threshold == 0 {
            return Err(Error::InvalidPool(
                "error_threshold must be at least 1".into(),
            ));
        }

        let now = Utc::now();
        let slots = (1..=pool_size).map(|i| SlotState::new(i, now)).collect();
        info!(pool_size, error_threshold, "key rotation pool initialized");
        metrics::gauge!("gemini_active_key_slot").set(1.0);

        Ok(Self {
            slots: Mutex::new(slots),
            current: AtomicUsize::new(1),
            error_threshold,
            source,
        })
    }

    /// Key bound to the active slot.
    ///
    /// Does not touch slot state. Fails with `Error::Configuration` when the
    /// active slot has no key; callers must treat that as fatal and must not
    /// report it as a failure.
    pub fn current_credential(&self) -> Result<CredentialHandle> {
        let slot = self.current.load(Ordering::Acquire);
        match self.source.resolve(slot) {
            Some(key) => Ok(CredentialHandle { slot, key }),
            None => {
                let name = self.source.name(slot);
                error!(slot, setting = %name, "active key slot has no credential configured");
                Err(Error::Configuration { slot, name })
            }
        }
    }

    /// Record a successful call on the active slot. Never rotates.
    pub fn report_success(&self) {
        let mut slots = self.lock_slots();
        let slot = self.current.load(Ordering::Acquire);
        let state = &mut slots[slot - 1];
        state.request_count += 1;
        state.last_used_at = Utc::now();
        debug!(slot, request_count = state.request_count, "key request succeeded");
        metrics::counter!("gemini_key_requests_total", "outcome" => "success").increment(1);
    }

    /// Record a failed call on the active slot and rotate when warranted.
    ///
    /// - Rate limit → blacklist the slot and rotate (checked first)
    /// - Generic below threshold → no rotation, caller may retry the same slot
    /// - Generic at or above threshold → rotate, slot stays eligible
    pub fn report_failure(&self, detail: &FailureDetail) {
        let class = classify_failure(detail);
        metrics::counter!("gemini_key_requests_total", "outcome" => class.label()).increment(1);

        let mut slots = self.lock_slots();
        let slot = self.current.load(Ordering::Acquire);
        let state = &mut slots[slot - 1];
        state.error_count += 1;
        state.last_used_at = Utc::now();
        let error_count = state.error_count;

        match class {
            FailureClass::RateLimit => {
                warn!(slot, error_count, status = ?detail.status, "rate limit reached on key");
                state.rate_limit_reached = true;
                self.rotate(&mut slots, slot, RotationReason::RateLimit);
            }
            FailureClass::Generic if error_count >= self.error_threshold => {
                warn!(
                    slot,
                    error_count,
                    threshold = self.error_threshold,
                    "error threshold reached on key"
                );
                self.rotate(&mut slots, slot, RotationReason::ErrorThreshold);
            }
            FailureClass::Generic => {
                debug!(
                    slot,
                    error_count,
                    threshold = self.error_threshold,
                    "generic failure below threshold, keeping key"
                );
            }
        }
    }

    /// Move to the first slot after `from` (wrapping) that is not rate
    /// limited. `from` itself is the last candidate. Falls back to a full
    /// reset when every slot is rate limited.
    ///
    /// Must be called with the slot lock held.
    fn rotate(&self, slots: &mut [SlotState], from: usize, reason: RotationReason) {
        let n = slots.len();
        for offset in 1..=n {
            let candidate = (from - 1 + offset) % n + 1;
            if !slots[candidate - 1].rate_limit_reached {
                self.current.store(candidate, Ordering::Release);
                info!(
                    from_slot = from,
                    to_slot = candidate,
                    reason = reason.label(),
                    "rotated to next key"
                );
                metrics::counter!("gemini_key_rotations_total", "reason" => reason.label())
                    .increment(1);
                metrics::gauge!("gemini_active_key_slot").set(candidate as f64);
                return;
            }
        }

        warn!(pool_size = n, "all keys rate limited, resetting rotation");
        slots.iter_mut().for_each(SlotState::clear);
        self.current.store(1, Ordering::Release);
        metrics::counter!("gemini_pool_resets_total").increment(1);
        metrics::gauge!("gemini_active_key_slot").set(1.0);
    }

    /// Index of the active slot (1-based).
    pub fn current_slot(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn pool_size(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn error_threshold(&self) -> u32 {
        self.error_threshold
    }

    /// Snapshot of every slot and the active index, taken atomically.
    pub fn status(&self) -> RotationStatus {
        let slots = self.lock_slots();
        RotationStatus {
            current_slot: self.current.load(Ordering::Acquire),
            pool_size: slots.len(),
            error_threshold: self.error_threshold,
            slots: slots.clone(),
        }
    }

    /// Pool health summary for the health endpoint.
    ///
    /// Status mapping: no slot rate limited → healthy, some → degraded. The
    /// pool is never unhealthy because exhausting it triggers a reset.
    pub fn health(&self) -> serde_json::Value {
        let status = self.status();
        let limited = status
            .slots
            .iter()
            .filter(|s| s.rate_limit_reached)
            .count();
        let pool_status = if limited == 0 { "healthy" } else { "degraded" };

        serde_json::json!({
            "status": pool_status,
            "current_slot": status.current_slot,
            "keys_total": status.pool_size,
            "keys_available": status.pool_size - limited,
            "keys_rate_limited": limited,
        })
    }

    /// A panic inside the critical section leaves counters consistent (every
    /// mutation is a single field write), so poisoning is ignored.
    fn lock_slots(&self) -> MutexGuard<'_, Vec<SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
