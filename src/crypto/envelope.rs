// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shielded Call Envelope
//!
//! The envelope replaces plaintext call data in `eth_call` and transaction
//! requests:
//!
//! ```text
//! [caller public key (32) | nonce (15) | ad (16) | ciphertext+tag (>= 16)]
//! ```
//!
//! The node recovers the shared key from the caller public key, runs the call
//! and seals the output under the same key. Query responses therefore come
//! back as a bare sealed payload without the public-key prefix.

use super::ecdh::{SharedCipher, PUBLIC_KEY_SIZE};
use super::encryption::{SealedPayload, MIN_SEALED_SIZE};
use super::key_derivation::CallerKeyMaterial;
use super::CryptoError;
use tracing::debug;

/// Smallest valid outbound envelope
pub const MIN_ENVELOPE_SIZE: usize = PUBLIC_KEY_SIZE + MIN_SEALED_SIZE;

/// Outbound shielded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender_public_key: [u8; PUBLIC_KEY_SIZE],
    pub sealed: SealedPayload,
}

impl Envelope {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return Err(CryptoError::InvalidEnvelope {
                expected_min: MIN_ENVELOPE_SIZE,
                actual: bytes.len(),
            });
        }

        let mut sender_public_key = [0u8; PUBLIC_KEY_SIZE];
        sender_public_key.copy_from_slice(&bytes[..PUBLIC_KEY_SIZE]);

        Ok(Self {
            sender_public_key,
            sealed: SealedPayload::from_bytes(&bytes[PUBLIC_KEY_SIZE..])?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.sender_public_key.to_vec();
        out.extend_from_slice(&self.sealed.to_bytes());
        out
    }

    /// The sealed part alone, as the node would send it back
    pub fn sealed_bytes(&self) -> Vec<u8> {
        self.sealed.to_bytes()
    }
}

/// Caller-side envelope operations
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Encrypt ABI-encoded call data for the node owning `node_public_key`
    ///
    /// # Errors
    ///
    /// `EncryptionFailed` if the node key is a low-order point or sealing fails.
    pub fn encrypt(
        caller: &CallerKeyMaterial,
        node_public_key: &[u8; PUBLIC_KEY_SIZE],
        plaintext: &[u8],
    ) -> Result<Envelope, CryptoError> {
        let cipher = SharedCipher::establish(caller, node_public_key)?;
        let sealed = cipher.seal(plaintext)?;

        debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = sealed.ciphertext.len(),
            "sealed call data into envelope"
        );

        Ok(Envelope {
            sender_public_key: caller.public_key(),
            sealed,
        })
    }

    /// Decrypt a node response sealed for `caller`
    ///
    /// # Errors
    ///
    /// `InvalidEnvelope` for truncated input, `DecryptionFailed` when the
    /// response was not sealed under this (caller, node) pair.
    pub fn decrypt(
        caller: &CallerKeyMaterial,
        node_public_key: &[u8; PUBLIC_KEY_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let sealed = SealedPayload::from_bytes(ciphertext)?;
        let cipher = SharedCipher::establish(caller, node_public_key).map_err(|e| match e {
            CryptoError::EncryptionFailed { reason, .. } => CryptoError::DecryptionFailed {
                operation: "ecdh".to_string(),
                reason,
            },
            other => other,
        })?;
        cipher.open(&sealed)
    }
}
