// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod node_key;
pub mod rpc;
pub mod version;

// Re-export main types
pub use client::{
    ClientConfig, NodeResponse, PendingShieldedTransaction, ResponseClassifier, RevertPayload,
    RevertSelectorClassifier, ShieldedCall, ShieldedRpcClient,
};
pub use config::ShieldedConfig;
pub use crypto::{CallerKeyMaterial, CallerSecret, CryptoError, Envelope, EnvelopeCodec, PrivateKey};
pub use error::{Result, ShieldedError};
pub use node_key::{NodeKeyDirectory, NodePublicKey};
pub use rpc::{HttpTransport, NodeKeyResponse, NodeKeySource, NodeTransport, SignedCallRequest};
