// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for shielded calls and transactions
//!
//! Every failure surfaces to the immediate caller. Nothing here is retried and
//! transport errors are carried through unchanged.

use crate::client::response::RevertPayload;
use crate::crypto::CryptoError;
use crate::rpc::revert_data;
use ethers::providers::ProviderError;
use ethers::signers::WalletError;
use ethers::types::H256;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the node key directory and the shielded client
#[derive(Error, Debug)]
pub enum ShieldedError {
    /// The node did not hand out a usable public key
    #[error("Cannot resolve node public key for {endpoint}: {reason}")]
    KeyResolution { endpoint: String, reason: String },

    /// Envelope encryption or response decryption failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The node answered a query with a plaintext ABI revert instead of ciphertext
    #[error("{0}")]
    Reverted(RevertPayload),

    /// The transaction was mined with a failure status
    #[error("transaction {tx_hash:?} reverted")]
    TransactionReverted { tx_hash: H256 },

    /// Anything the RPC transport raised
    #[error("Transport error: {0}")]
    Transport(#[from] ProviderError),

    /// Local signing of a transaction or signed query failed
    #[error("Signing failed: {0}")]
    Signing(#[from] WalletError),

    /// Client is missing something the operation needs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation exceeded its deadline
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ShieldedError {
    /// `Transport`, or `Reverted` when the node's error object carries an
    /// `Error(string)` payload (e.g. a reverting gas estimate)
    pub fn from_transport(err: ProviderError) -> Self {
        match revert_data(&err) {
            Some(data) => ShieldedError::Reverted(RevertPayload::new(data)),
            None => ShieldedError::Transport(err),
        }
    }

    /// Whether the failure is a contract-level revert (query or mined transaction)
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            ShieldedError::Reverted(_) | ShieldedError::TransactionReverted { .. }
        )
    }

    /// The decoded revert reason, when the node returned one
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ShieldedError::Reverted(payload) => payload.reason(),
            _ => None,
        }
    }
}

pub type Result<T, E = ShieldedError> = std::result::Result<T, E>;
