// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deoxys-II Encryption/Decryption
//!
//! Implements authenticated encryption using Deoxys-II-256-128, the AEAD the
//! node uses for call data and query responses.
//!
//! **Sealed payload format**:
//! ```text
//! [nonce (15 bytes) | ad (16 bytes) | ciphertext+tag (>= 16 bytes)]
//! ```
//!
//! The associated-data field travels on the wire next to the nonce, so the
//! receiver never needs side-channel state to open a payload.

use super::CryptoError;
use deoxys::aead::{generic_array::GenericArray, Aead, KeyInit, Payload};
use deoxys::DeoxysII256;
use rand::{rngs::OsRng, RngCore};

/// Deoxys-II nonce size in bytes
pub const NONCE_SIZE: usize = 15;

/// Size of the associated-data field carried on the wire
pub const AD_SIZE: usize = 16;

/// Deoxys-II authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Smallest valid sealed payload: nonce, ad and a bare tag
pub const MIN_SEALED_SIZE: usize = NONCE_SIZE + AD_SIZE + TAG_SIZE;

/// A Deoxys-II sealed payload as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_SIZE],
    pub ad: [u8; AD_SIZE],
    /// Ciphertext with the 16-byte tag appended
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Parse `nonce | ad | ciphertext+tag`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_SEALED_SIZE {
            return Err(CryptoError::InvalidEnvelope {
                expected_min: MIN_SEALED_SIZE,
                actual: bytes.len(),
            });
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let mut ad = [0u8; AD_SIZE];
        ad.copy_from_slice(&bytes[NONCE_SIZE..NONCE_SIZE + AD_SIZE]);

        Ok(Self {
            nonce,
            ad,
            ciphertext: bytes[NONCE_SIZE + AD_SIZE..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        [self.nonce.as_slice(), self.ad.as_slice(), &self.ciphertext].concat()
    }
}

/// Encrypt data using Deoxys-II with a fresh random nonce
///
/// # Arguments
///
/// * `plaintext` - Data to encrypt
/// * `key` - 32-byte encryption key
///
/// # Returns
///
/// Sealed payload with a zero-filled associated-data field
pub fn seal_with_deoxys(plaintext: &[u8], key: &[u8; 32]) -> Result<SealedPayload, CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    let ad = [0u8; AD_SIZE];

    let cipher = DeoxysII256::new(GenericArray::from_slice(key));
    let payload = Payload {
        msg: plaintext,
        aad: &ad,
    };

    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(&nonce), payload)
        .map_err(|e| CryptoError::EncryptionFailed {
            operation: "deoxys_seal".to_string(),
            reason: e.to_string(),
        })?;

    Ok(SealedPayload {
        nonce,
        ad,
        ciphertext,
    })
}

/// Decrypt a sealed payload using Deoxys-II
///
/// # Errors
///
/// Returns `DecryptionFailed` if the authentication tag does not verify
/// (tampered data, or a key that did not produce this payload).
pub fn open_with_deoxys(sealed: &SealedPayload, key: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let cipher = DeoxysII256::new(GenericArray::from_slice(key));
    let payload = Payload {
        msg: &sealed.ciphertext,
        aad: &sealed.ad,
    };

    cipher
        .decrypt(GenericArray::from_slice(&sealed.nonce), payload)
        .map_err(|e| CryptoError::DecryptionFailed {
            operation: "deoxys_open".to_string(),
            reason: format!("authentication error: {}", e),
        })
}
