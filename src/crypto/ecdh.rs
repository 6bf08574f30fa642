// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Agreement
//!
//! Implements x25519 Diffie-Hellman between a caller key and the node's static
//! public key. The raw shared secret is run through HMAC-SHA256 under the
//! `IOEncryptionKeyV1` prefix to produce the Deoxys-II key.
//!
//! The agreement is symmetric: `establish(caller, node_pub)` and
//! `establish(node, caller_pub)` produce the same cipher. The node relies on
//! this to open requests and seal responses without any handshake.

use super::encryption::{open_with_deoxys, seal_with_deoxys, SealedPayload};
use super::key_derivation::{hmac_derive, CallerKeyMaterial, IO_KEY_PREFIX};
use super::CryptoError;
use x25519_dalek::PublicKey;

/// Size of an x25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Parse a peer public key, rejecting anything that is not 32 bytes
pub fn parse_public_key(bytes: &[u8]) -> Result<[u8; PUBLIC_KEY_SIZE], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidKey {
        key_type: "x25519_public_key".to_string(),
        reason: format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            bytes.len()
        ),
    })
}

/// Derive the 32-byte AEAD key shared between `local` and `remote_public`
///
/// # Errors
///
/// Returns `EncryptionFailed` when the peer key is a low-order point, which
/// would make the shared secret predictable.
pub fn derive_shared_key(
    local: &CallerKeyMaterial,
    remote_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<[u8; 32], CryptoError> {
    let remote = PublicKey::from(*remote_public);
    let shared_secret = local.secret().diffie_hellman(&remote);

    if !shared_secret.was_contributory() {
        return Err(CryptoError::EncryptionFailed {
            operation: "ecdh".to_string(),
            reason: "peer public key is a low-order point".to_string(),
        });
    }

    hmac_derive(shared_secret.as_bytes(), IO_KEY_PREFIX)
}

/// AEAD cipher bound to one (local key, remote public key) pair
pub struct SharedCipher {
    key: [u8; 32],
}

impl SharedCipher {
    /// Perform ECDH and derive the envelope key
    pub fn establish(
        local: &CallerKeyMaterial,
        remote_public: &[u8; PUBLIC_KEY_SIZE],
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            key: derive_shared_key(local, remote_public)?,
        })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<SealedPayload, CryptoError> {
        seal_with_deoxys(plaintext, &self.key)
    }

    pub fn open(&self, sealed: &SealedPayload) -> Result<Vec<u8>, CryptoError> {
        open_with_deoxys(sealed, &self.key)
    }
}
