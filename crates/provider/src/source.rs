//! Credential sources: process environment and in-memory

use std::collections::HashMap;

use common::Secret;
use tracing::debug;

use crate::CredentialSource;

/// Reads `<PREFIX>_API_KEY_<slot>` from the process environment on every lookup.
///
/// Blank values count as missing, so an exported-but-empty variable surfaces as
/// a configuration error instead of an upstream 400.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    prefix: String,
}

impl EnvCredentialSource {
    /// `prefix` is the provider part of the variable name, e.g. `"GEMINI"`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl CredentialSource for EnvCredentialSource {
    fn resolve(&self, slot: usize) -> Option<Secret<String>> {
        let name = self.name(slot);
        match std::env::var(&name) {
            Ok(value) => Secret::non_empty(value),
            Err(_) => {
                debug!(variable = %name, "credential variable not set");
                None
            }
        }
    }

    fn name(&self, slot: usize) -> String {
        format!("{}_API_KEY_{slot}", self.prefix)
    }
}

/// Fixed slot→key map held in memory.
#[derive(Default)]
pub struct StaticCredentialSource {
    keys: HashMap<usize, Secret<String>>,
}

impl StaticCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `slot`, replacing any previous key.
    pub fn with_key(mut self, slot: usize, key: impl Into<String>) -> Self {
        self.keys.insert(slot, Secret::new(key.into()));
        self
    }

    /// Source with keys `key-1 … key-n` bound to slots `1..=n`.
    pub fn numbered(n: usize) -> Self {
        (1..=n).fold(Self::new(), |source, slot| {
            source.with_key(slot, format!("key-{slot}"))
        })
    }
}

impl CredentialSource for StaticCredentialSource {
    fn resolve(&self, slot: usize) -> Option<Secret<String>> {
        self.keys.get(&slot).cloned()
    }

    fn name(&self, slot: usize) -> String {
        format!("static slot {slot}")
    }
}
