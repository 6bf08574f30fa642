// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON-RPC transport seam
//!
//! The client only needs a handful of node methods. They are expressed as two
//! traits so the key directory can depend on key resolution alone, and so
//! tests can stand in for a node without a network.

pub mod http;

use async_trait::async_trait;
use ethers::providers::{ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256, U64};
use serde::{Deserialize, Serialize};

use crate::client::response::REVERT_SELECTOR;

pub use http::HttpTransport;

/// Node method returning the current node public key
pub const NODE_PUBLIC_KEY_METHOD: &str = "eth_getNodePublicKey";

/// Result of asking a node for its public key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKeyResponse {
    /// `0x`-prefixed hex public key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Error reported by the node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeKeyResponse {
    pub fn key(public_key: impl Into<String>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            public_key: None,
            error: Some(message.into()),
        }
    }
}

/// Signed call sent through `eth_call`
///
/// The node recovers the sender from `v`, `r`, `s` as if this were a
/// transaction, but nothing is broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCallRequest {
    pub to: Address,
    pub data: Bytes,
    pub v: U64,
    pub r: U256,
    pub s: U256,
    pub chain_id: U64,
}

/// `Error(string)` revert carried in a JSON-RPC error's `data` field
///
/// Nodes report an `eth_call` or `eth_estimateGas` revert as an error object
/// (usually code 3) rather than as call output.
pub fn revert_data(err: &ProviderError) -> Option<Bytes> {
    let data = err.as_error_response()?.data.as_ref()?.as_str()?;
    let bytes: Bytes = data.parse().ok()?;
    bytes.starts_with(&REVERT_SELECTOR).then_some(bytes)
}

/// Source of node public keys, addressed by RPC endpoint
#[async_trait]
pub trait NodeKeySource: Send + Sync {
    /// RPC endpoint URL, used as the cache key
    fn endpoint(&self) -> String;

    /// Fetch the node's current public key
    ///
    /// JSON-RPC level failures come back as `NodeKeyResponse::error`;
    /// only transport failures are `Err`.
    async fn fetch_node_public_key(&self) -> Result<NodeKeyResponse, ProviderError>;
}

/// Everything the shielded client asks of a node
#[async_trait]
pub trait NodeTransport: NodeKeySource {
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Read-only call (`eth_call` at latest block)
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ProviderError>;

    /// Read-only call carrying a signature
    async fn signed_call(&self, request: &SignedCallRequest) -> Result<Bytes, ProviderError>;

    /// Fill nonce, gas and gas price for `tx`
    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<(), ProviderError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ProviderError>;

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;
}
