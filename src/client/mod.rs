// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shielded RPC Client
//!
//! Composes the node key directory and the envelope codec into the three
//! public operations:
//!
//! - [`ShieldedRpcClient::send_shielded_query`]: encrypted `eth_call`, response decrypted
//! - [`ShieldedRpcClient::send_shielded_transaction`]: encrypted, locally signed transaction
//! - [`ShieldedRpcClient::send_signed_shielded_query`]: encrypted `eth_call` carrying
//!   a transaction signature so the contract can recover the sender
//!
//! Query responses go through a [`ResponseClassifier`] first. A plaintext
//! `Error(string)` revert is surfaced as [`ShieldedError::Reverted`] without
//! attempting decryption.

pub mod pending;
pub mod request;
pub mod response;

use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U64};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ShieldedConfig;
use crate::crypto::{CallerKeyMaterial, CallerSecret, EnvelopeCodec, PrivateKey};
use crate::error::{Result, ShieldedError};
use crate::node_key::{NodeKeyDirectory, NodePublicKey};
use crate::rpc::{HttpTransport, NodeTransport, SignedCallRequest};

pub use pending::PendingShieldedTransaction;
pub use request::ShieldedCall;
pub use response::{
    NodeResponse, ResponseClassifier, RevertPayload, RevertSelectorClassifier, REVERT_SELECTOR,
};

/// Timing and chain settings for a client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chain id for signing; asked from the node once when unset
    pub chain_id: Option<u64>,
    /// Deadline for each query or submission
    pub request_timeout: Option<Duration>,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            request_timeout: None,
            receipt_poll_interval: Duration::from_millis(500),
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

/// Client for confidential calls against one node endpoint
pub struct ShieldedRpcClient {
    transport: Arc<dyn NodeTransport>,
    directory: Arc<NodeKeyDirectory>,
    classifier: Arc<dyn ResponseClassifier>,
    signer: Option<PrivateKey>,
    config: ClientConfig,
    chain_id: OnceCell<u64>,
}

impl ShieldedRpcClient {
    /// Client with its own key directory, no signer and default settings
    pub fn new(transport: Arc<dyn NodeTransport>) -> Self {
        Self {
            transport,
            directory: Arc::new(NodeKeyDirectory::new()),
            classifier: Arc::new(RevertSelectorClassifier),
            signer: None,
            config: ClientConfig::default(),
            chain_id: OnceCell::new(),
        }
    }

    /// HTTP-backed client built from loaded configuration
    pub fn from_config(config: &ShieldedConfig) -> Result<Self> {
        config.validate()?;

        let client_config = config.client_config();
        let transport = HttpTransport::new(&config.rpc_url)?
            .with_polling_interval(client_config.receipt_poll_interval);

        let directory = match config.node_key_ttl() {
            Some(ttl) => NodeKeyDirectory::with_ttl(ttl),
            None => NodeKeyDirectory::new(),
        };

        let mut client = Self::new(Arc::new(transport))
            .with_directory(Arc::new(directory))
            .with_config(client_config);

        if let Some(key) = config.private_key()? {
            client = client.with_wallet(key);
        }

        info!(rpc_url = %config.rpc_url, "🔐 Shielded RPC client ready");
        Ok(client)
    }

    /// Share a key directory with other clients
    pub fn with_directory(mut self, directory: Arc<NodeKeyDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Key that signs transactions and signed queries
    ///
    /// Transactions also derive their envelope key from it unless the call
    /// sets its own caller secret.
    pub fn with_wallet(mut self, key: PrivateKey) -> Self {
        self.signer = Some(key);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn directory(&self) -> &Arc<NodeKeyDirectory> {
        &self.directory
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Address of the configured signer, if any
    pub fn signer_address(&self) -> Result<Option<Address>> {
        match &self.signer {
            Some(key) => Ok(Some(key.to_wallet(0)?.address())),
            None => Ok(None),
        }
    }

    /// Node public key for this client's endpoint (cached)
    pub async fn node_public_key(&self) -> Result<NodePublicKey> {
        self.directory.get_public_key(self.transport.as_ref()).await
    }

    /// Drop the cached node key and fetch it again
    pub async fn refresh_node_key(&self) -> Result<NodePublicKey> {
        self.directory.refresh(self.transport.as_ref()).await
    }

    /// Chain id from config, otherwise asked from the node once
    pub async fn chain_id(&self) -> Result<u64> {
        if let Some(chain_id) = self.config.chain_id {
            return Ok(chain_id);
        }

        let chain_id = self
            .chain_id
            .get_or_try_init(|| async {
                let chain_id = self.transport.chain_id().await?;
                debug!(chain_id, "resolved chain id from node");
                Ok::<_, ShieldedError>(chain_id)
            })
            .await?;
        Ok(*chain_id)
    }

    /// Encrypted read-only call; returns the decrypted output
    ///
    /// Uses a fresh random envelope key unless the call sets one.
    ///
    /// # Errors
    ///
    /// - `Reverted` when the node answers with a plaintext revert
    /// - `KeyResolution`, `Crypto` and `Transport` from the collaborators
    /// - `Cancelled` / `Timeout`
    pub async fn send_shielded_query(&self, call: ShieldedCall) -> Result<Bytes> {
        let cancellation = call.cancellation.clone();
        self.guarded(cancellation.as_ref(), self.query(call)).await
    }

    /// Encrypted, locally signed transaction
    ///
    /// The returned handle only carries the hash; call
    /// [`PendingShieldedTransaction::wait`] for the receipt.
    /// A transaction the node already rejects at gas estimation fails here
    /// with `Reverted`.
    pub async fn send_shielded_transaction(
        &self,
        call: ShieldedCall,
    ) -> Result<PendingShieldedTransaction> {
        let cancellation = call.cancellation.clone();
        self.guarded(cancellation.as_ref(), self.transact(call)).await
    }

    /// Encrypted `eth_call` signed like a transaction, never broadcast
    pub async fn send_signed_shielded_query(&self, call: ShieldedCall) -> Result<Bytes> {
        let cancellation = call.cancellation.clone();
        self.guarded(cancellation.as_ref(), self.signed_query(call)).await
    }

    async fn query(&self, call: ShieldedCall) -> Result<Bytes> {
        let node_key = self.node_public_key().await?;
        let caller = call.caller_secret.clone().unwrap_or_default().derive()?;
        let envelope = EnvelopeCodec::encrypt(&caller, node_key.as_bytes(), &call.data)?;

        let mut request = TransactionRequest::new()
            .to(call.to)
            .data(envelope.to_bytes());
        if let Some(value) = call.value {
            request = request.value(value);
        }
        if let Some(gas) = call.gas {
            request = request.gas(gas);
        }

        debug!(to = ?call.to, "sending shielded query");
        let response = self.transport.call(&request.into()).await?;
        self.open_response(&caller, &node_key, response)
    }

    async fn transact(&self, call: ShieldedCall) -> Result<PendingShieldedTransaction> {
        let key = self.require_signer("shielded transaction")?;
        let chain_id = self.chain_id().await?;
        let wallet = key.to_wallet(chain_id)?;

        let node_key = self.node_public_key().await?;
        let secret = call
            .caller_secret
            .clone()
            .unwrap_or_else(|| CallerSecret::PrivateKey(key.clone()));
        let caller = secret.derive()?;
        let envelope = EnvelopeCodec::encrypt(&caller, node_key.as_bytes(), &call.data)?;

        let mut request = TransactionRequest::new()
            .from(wallet.address())
            .to(call.to)
            .data(envelope.to_bytes())
            .chain_id(chain_id);
        if let Some(value) = call.value {
            request = request.value(value);
        }
        if let Some(gas) = call.gas {
            request = request.gas(gas);
        }

        let mut tx: TypedTransaction = request.into();
        self.transport
            .fill_transaction(&mut tx)
            .await
            .map_err(ShieldedError::from_transport)?;

        let signature = wallet.sign_transaction_sync(&tx)?;
        let raw = tx.rlp_signed(&signature);
        let tx_hash = self.transport.send_raw_transaction(raw).await?;

        info!(
            tx_hash = ?tx_hash,
            from = ?wallet.address(),
            to = ?call.to,
            "📤 Shielded transaction submitted"
        );

        Ok(PendingShieldedTransaction::new(
            tx_hash,
            self.transport.clone(),
            self.config.receipt_poll_interval,
            self.config.receipt_timeout,
        ))
    }

    async fn signed_query(&self, call: ShieldedCall) -> Result<Bytes> {
        let key = self.require_signer("signed shielded query")?;
        let chain_id = self.chain_id().await?;
        let wallet = key.to_wallet(chain_id)?;

        let node_key = self.node_public_key().await?;
        let caller = call.caller_secret.clone().unwrap_or_default().derive()?;
        let data = Bytes::from(EnvelopeCodec::encrypt(&caller, node_key.as_bytes(), &call.data)?.to_bytes());

        let tx: TypedTransaction = TransactionRequest::new()
            .to(call.to)
            .data(data.clone())
            .chain_id(chain_id)
            .into();
        let signature = wallet.sign_transaction_sync(&tx)?;

        let request = SignedCallRequest {
            to: call.to,
            data,
            v: U64::from(signature.v),
            r: signature.r,
            s: signature.s,
            chain_id: U64::from(chain_id),
        };

        debug!(to = ?call.to, from = ?wallet.address(), "sending signed shielded query");
        let response = self.transport.signed_call(&request).await?;
        self.open_response(&caller, &node_key, response)
    }

    fn open_response(
        &self,
        caller: &CallerKeyMaterial,
        node_key: &NodePublicKey,
        response: Bytes,
    ) -> Result<Bytes> {
        match self.classifier.classify(&response) {
            NodeResponse::Empty => {
                debug!("node returned empty output");
                Ok(Bytes::new())
            }
            NodeResponse::PlainRevert => {
                let payload = RevertPayload::new(response);
                warn!(reason = ?payload.reason(), "shielded query reverted");
                Err(ShieldedError::Reverted(payload))
            }
            NodeResponse::Encrypted => {
                let plaintext = EnvelopeCodec::decrypt(caller, node_key.as_bytes(), &response)?;
                Ok(Bytes::from(plaintext))
            }
        }
    }

    fn require_signer(&self, operation: &str) -> Result<&PrivateKey> {
        self.signer.as_ref().ok_or_else(|| {
            ShieldedError::Configuration(format!("{} requires a wallet, none configured", operation))
        })
    }

    /// Run `operation` under the request timeout, abandoning it on cancellation
    async fn guarded<T, F>(&self, cancellation: Option<&CancellationToken>, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timed = async {
            match self.config.request_timeout {
                Some(limit) => tokio::time::timeout(limit, operation)
                    .await
                    .unwrap_or_else(|_| Err(ShieldedError::Timeout(limit))),
                None => operation.await,
            }
        };

        match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    warn!("⚠️  Shielded call cancelled by caller");
                    Err(ShieldedError::Cancelled)
                }
                result = timed => result,
            },
            None => timed.await,
        }
    }
}
