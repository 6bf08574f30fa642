// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, TransactionReceipt, H256};
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    revert_data, NodeKeyResponse, NodeKeySource, NodeTransport, SignedCallRequest,
    NODE_PUBLIC_KEY_METHOD,
};
use crate::error::ShieldedError;

/// `NodeTransport` over an ethers HTTP provider
#[derive(Debug, Clone)]
pub struct HttpTransport {
    provider: Provider<Http>,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(rpc_url: &str) -> Result<Self, ShieldedError> {
        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| {
            ShieldedError::Configuration(format!("Failed to create provider for {}: {}", rpc_url, e))
        })?;

        Ok(Self {
            provider,
            endpoint: rpc_url.to_string(),
        })
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.provider = self.provider.interval(interval);
        self
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }
}

#[async_trait]
impl NodeKeySource for HttpTransport {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch_node_public_key(&self) -> Result<NodeKeyResponse, ProviderError> {
        debug!(endpoint = %self.endpoint, "requesting node public key");

        match self
            .provider
            .request::<_, String>(NODE_PUBLIC_KEY_METHOD, ["latest"])
            .await
        {
            Ok(public_key) => Ok(NodeKeyResponse::key(public_key)),
            Err(err) => match err.as_error_response() {
                Some(rpc_error) => {
                    warn!(
                        endpoint = %self.endpoint,
                        code = rpc_error.code,
                        "node refused public key request: {}",
                        rpc_error.message
                    );
                    Ok(NodeKeyResponse::error(rpc_error.message.clone()))
                }
                None => Err(err),
            },
        }
    }
}

#[async_trait]
impl NodeTransport for HttpTransport {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let chain_id = self.provider.get_chainid().await?;
        Ok(chain_id.as_u64())
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ProviderError> {
        revert_as_output(self.provider.call(tx, None).await)
    }

    async fn signed_call(&self, request: &SignedCallRequest) -> Result<Bytes, ProviderError> {
        revert_as_output(self.provider.request("eth_call", (request, "latest")).await)
    }

    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<(), ProviderError> {
        self.provider.fill_transaction(tx, None).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ProviderError> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.provider.get_transaction_receipt(tx_hash).await
    }
}

/// Hand a reverted call's `Error(string)` payload back as call output
///
/// The node reports reverts as JSON-RPC errors; the client's response
/// classifier expects them in the output.
fn revert_as_output(result: Result<Bytes, ProviderError>) -> Result<Bytes, ProviderError> {
    match result {
        Err(err) => match revert_data(&err) {
            Some(data) => {
                debug!("eth_call reverted, passing revert data through");
                Ok(data)
            }
            None => Err(err),
        },
        ok => ok,
    }
}
