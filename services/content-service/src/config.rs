//! Configuration types and loading
//!
//! Config precedence: CLI `--config` > `CONFIG_PATH` env var > default file name.
//! API keys never appear in the TOML; they are read per slot from
//! `<key_env_prefix>_API_KEY_<i>` at request time.

use gemini_client::DEFAULT_ENDPOINT;
use gemini_pool::{DEFAULT_ERROR_THRESHOLD, DEFAULT_POOL_SIZE};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Separate listener for the rotation status API. Disabled when absent.
    #[serde(default)]
    pub admin_listen_addr: Option<SocketAddr>,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Gemini endpoint and caller retry settings
#[derive(Debug, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_key_env_prefix")]
    pub key_env_prefix: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Outbound attempts per generation request, across rotations
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Key pool shape
#[derive(Debug, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            key_env_prefix: default_key_env_prefix(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            error_threshold: default_error_threshold(),
        }
    }
}

fn default_max_connections() -> usize {
    100
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_key_env_prefix() -> String {
    "GEMINI".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_error_threshold() -> u32 {
    DEFAULT_ERROR_THRESHOLD
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.gemini.endpoint.starts_with("http://")
            && !self.gemini.endpoint.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "gemini.endpoint must start with http:// or https://, got: {}",
                self.gemini.endpoint
            )));
        }

        if self.gemini.key_env_prefix.trim().is_empty() {
            return Err(common::Error::Config(
                "gemini.key_env_prefix must not be empty".into(),
            ));
        }

        let positive = [
            ("gemini.timeout_secs", self.gemini.timeout_secs == 0),
            ("gemini.max_attempts", self.gemini.max_attempts == 0),
            ("server.max_connections", self.server.max_connections == 0),
            ("rotation.pool_size", self.rotation.pool_size == 0),
            ("rotation.error_threshold", self.rotation.error_threshold == 0),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, is_zero)| *is_zero) {
            return Err(common::Error::Config(format!(
                "{field} must be greater than 0"
            )));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("content-service.toml")
    }
}
