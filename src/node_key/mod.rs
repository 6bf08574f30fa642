// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node Public Key Directory
//!
//! Resolves and caches the node's encryption public key per RPC endpoint.
//! Keys are fetched lazily, at most once per endpoint while the entry is live:
//! concurrent cold requests share a single fetch, and a failed fetch leaves the
//! entry empty so the next caller retries.
//!
//! **Key rotation**: the node gives no signal when it rotates its key. Use a
//! TTL or call [`NodeKeyDirectory::invalidate`] after a decryption failure.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::crypto::{normalize_hex, PUBLIC_KEY_SIZE};
use crate::error::ShieldedError;
use crate::rpc::NodeKeySource;

/// Node encryption public key, as fetched from one endpoint
///
/// Equality ignores when the key was fetched.
#[derive(Clone)]
pub struct NodePublicKey {
    bytes: [u8; PUBLIC_KEY_SIZE],
    source_endpoint: String,
    fetched_at: Instant,
}

impl NodePublicKey {
    pub fn new(bytes: [u8; PUBLIC_KEY_SIZE], source_endpoint: impl Into<String>) -> Self {
        Self {
            bytes,
            source_endpoint: source_endpoint.into(),
            fetched_at: Instant::now(),
        }
    }

    /// Parse the `0x`-hex key returned by the node
    pub fn from_hex(hex_key: &str, source_endpoint: &str) -> Result<Self, ShieldedError> {
        let malformed = |reason: String| ShieldedError::KeyResolution {
            endpoint: source_endpoint.to_string(),
            reason,
        };

        let raw = hex::decode(normalize_hex(hex_key))
            .map_err(|e| malformed(format!("public key is not valid hex: {}", e)))?;
        let bytes: [u8; PUBLIC_KEY_SIZE] = raw.as_slice().try_into().map_err(|_| {
            malformed(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                raw.len()
            ))
        })?;

        Ok(Self::new(bytes, source_endpoint))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    pub fn source_endpoint(&self) -> &str {
        &self.source_endpoint
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }
}

impl PartialEq for NodePublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.source_endpoint == other.source_endpoint
    }
}

impl Eq for NodePublicKey {}

impl fmt::Debug for NodePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePublicKey")
            .field("key", &self.to_hex())
            .field("source_endpoint", &self.source_endpoint)
            .finish()
    }
}

type KeySlot = Arc<OnceCell<NodePublicKey>>;

/// Per-endpoint cache of node public keys
///
/// Share one directory between clients with `Arc` to share the cache.
///
/// # Example
///
/// ```ignore
/// let directory = NodeKeyDirectory::with_ttl(Duration::from_secs(600));
/// let key = directory.get_public_key(&transport).await?;
/// directory.invalidate(&transport.endpoint()).await;
/// ```
#[derive(Default)]
pub struct NodeKeyDirectory {
    slots: RwLock<HashMap<String, KeySlot>>,
    ttl: Option<Duration>,
}

impl NodeKeyDirectory {
    /// Directory whose entries never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory whose entries are refetched once older than `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Return the node public key for `source`'s endpoint
    ///
    /// Cached keys are returned without a network call.
    ///
    /// # Errors
    ///
    /// - `KeyResolution` when the node response carries no key; the node's
    ///   error message is included verbatim
    /// - `Transport` when the request itself fails
    pub async fn get_public_key<S>(&self, source: &S) -> Result<NodePublicKey, ShieldedError>
    where
        S: NodeKeySource + ?Sized,
    {
        let endpoint = source.endpoint();
        let slot = self.slot_for(&endpoint).await;

        if let Some(key) = slot.get() {
            debug!(endpoint = %endpoint, "node public key cache hit");
            return Ok(key.clone());
        }

        let key = slot
            .get_or_try_init(|| Self::resolve(source, &endpoint))
            .await?;
        Ok(key.clone())
    }

    /// Drop the cached key for `endpoint`; returns whether one was cached
    pub async fn invalidate(&self, endpoint: &str) -> bool {
        let removed = self.slots.write().await.remove(endpoint);
        let had_key = removed.map(|slot| slot.initialized()).unwrap_or(false);
        if had_key {
            info!(endpoint = %endpoint, "🗑️  Node public key invalidated");
        }
        had_key
    }

    /// Invalidate and fetch again
    pub async fn refresh<S>(&self, source: &S) -> Result<NodePublicKey, ShieldedError>
    where
        S: NodeKeySource + ?Sized,
    {
        self.invalidate(&source.endpoint()).await;
        self.get_public_key(source).await
    }

    /// Cached, unexpired key for `endpoint`, without fetching
    pub async fn cached(&self, endpoint: &str) -> Option<NodePublicKey> {
        let slots = self.slots.read().await;
        slots
            .get(endpoint)
            .and_then(|slot| slot.get())
            .filter(|key| !self.is_expired(key))
            .cloned()
    }

    /// Number of endpoints with a resolved key
    pub async fn len(&self) -> usize {
        let slots = self.slots.read().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut slots = self.slots.write().await;
        let count = slots.len();
        slots.clear();
        info!("🗑️  Cleared all node public keys (count: {})", count);
    }

    fn is_expired(&self, key: &NodePublicKey) -> bool {
        self.ttl.map(|ttl| key.age() >= ttl).unwrap_or(false)
    }

    fn slot_is_live(&self, slot: &KeySlot) -> bool {
        slot.get().map(|key| !self.is_expired(key)).unwrap_or(true)
    }

    async fn slot_for(&self, endpoint: &str) -> KeySlot {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(endpoint) {
                if self.slot_is_live(slot) {
                    return slot.clone();
                }
            }
        }

        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get(endpoint) {
            // Another task may have replaced the expired slot while we waited
            if self.slot_is_live(slot) {
                return slot.clone();
            }
            debug!(endpoint = %endpoint, "node public key expired");
        }

        let slot: KeySlot = Arc::new(OnceCell::new());
        slots.insert(endpoint.to_string(), slot.clone());
        slot
    }

    async fn resolve<S>(source: &S, endpoint: &str) -> Result<NodePublicKey, ShieldedError>
    where
        S: NodeKeySource + ?Sized,
    {
        let response = source.fetch_node_public_key().await?;

        let hex_key = response.public_key.ok_or_else(|| ShieldedError::KeyResolution {
            endpoint: endpoint.to_string(),
            reason: response
                .error
                .unwrap_or_else(|| "node response carries no public key".to_string()),
        })?;

        let key = NodePublicKey::from_hex(&hex_key, endpoint)?;
        info!(endpoint = %endpoint, key = %key.to_hex(), "🔑 Node public key resolved");
        Ok(key)
    }
}
