// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client configuration
//!
//! Loaded from `SHIELDED_*` environment variables (a `.env` file is honored)
//! or from a TOML file with the same fields:
//!
//! ```toml
//! rpc_url = "http://localhost:8545"
//! private_key = "0x..."
//! chain_id = 1291
//! node_key_ttl_secs = 600
//! request_timeout_ms = 30000
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::client::ClientConfig;
use crate::crypto::PrivateKey;
use crate::error::{Result, ShieldedError};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

pub const ENV_RPC_URL: &str = "SHIELDED_RPC_URL";
pub const ENV_PRIVATE_KEY: &str = "SHIELDED_PRIVATE_KEY";
pub const ENV_CHAIN_ID: &str = "SHIELDED_CHAIN_ID";
pub const ENV_NODE_KEY_TTL_SECS: &str = "SHIELDED_NODE_KEY_TTL_SECS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SHIELDED_REQUEST_TIMEOUT_MS";
pub const ENV_RECEIPT_POLL_INTERVAL_MS: &str = "SHIELDED_RECEIPT_POLL_INTERVAL_MS";
pub const ENV_RECEIPT_TIMEOUT_SECS: &str = "SHIELDED_RECEIPT_TIMEOUT_SECS";

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_receipt_poll_interval_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_INTERVAL_MS
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ShieldedConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Hex private key, `0x` prefix optional
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Node public key cache lifetime; cached for the process lifetime when unset
    #[serde(default)]
    pub node_key_ttl_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
}

impl Default for ShieldedConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            private_key: None,
            chain_id: None,
            node_key_ttl_secs: None,
            request_timeout_ms: None,
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
        }
    }
}

impl ShieldedConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable source (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(rpc_url) = lookup(ENV_RPC_URL) {
            config.rpc_url = rpc_url;
        }
        config.private_key = lookup(ENV_PRIVATE_KEY).filter(|key| !key.trim().is_empty());
        config.chain_id = parse_var(&lookup, ENV_CHAIN_ID)?;
        config.node_key_ttl_secs = parse_var(&lookup, ENV_NODE_KEY_TTL_SECS)?;
        config.request_timeout_ms = parse_var(&lookup, ENV_REQUEST_TIMEOUT_MS)?;
        if let Some(interval) = parse_var(&lookup, ENV_RECEIPT_POLL_INTERVAL_MS)? {
            config.receipt_poll_interval_ms = interval;
        }
        if let Some(timeout) = parse_var(&lookup, ENV_RECEIPT_TIMEOUT_SECS)? {
            config.receipt_timeout_secs = timeout;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShieldedError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ShieldedError::Configuration(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), "📋 Loaded shielded client config");
        Ok(config)
    }

    /// Check the RPC URL and private key format
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.rpc_url).map_err(|e| {
            ShieldedError::Configuration(format!("Invalid RPC URL '{}': {}", self.rpc_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShieldedError::Configuration(format!(
                "Unsupported RPC URL scheme '{}', expected http or https",
                url.scheme()
            )));
        }

        self.private_key()?;

        if self.receipt_poll_interval_ms == 0 {
            return Err(ShieldedError::Configuration(
                "receipt_poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed private key, if one is configured
    pub fn private_key(&self) -> Result<Option<PrivateKey>> {
        self.private_key
            .as_deref()
            .map(|raw| {
                raw.parse::<PrivateKey>()
                    .map_err(|e| ShieldedError::Configuration(format!("Invalid private key: {}", e)))
            })
            .transpose()
    }

    pub fn node_key_ttl(&self) -> Option<Duration> {
        self.node_key_ttl_secs.map(Duration::from_secs)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            chain_id: self.chain_id,
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }
}

impl fmt::Debug for ShieldedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldedConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .field("node_key_ttl_secs", &self.node_key_ttl_secs)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("receipt_poll_interval_ms", &self.receipt_poll_interval_ms)
            .field("receipt_timeout_secs", &self.receipt_timeout_secs)
            .finish()
    }
}

fn parse_var<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|e| {
            ShieldedError::Configuration(format!("{} must be an unsigned integer: {}", name, e))
        }),
        None => Ok(None),
    }
}
