// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error types for every envelope operation, with enough context to tell
//! which side of the exchange failed.
//!
//! ## Error Variants
//!
//! - **InvalidKey**: Key material has the wrong size or is unusable for ECDH
//! - **KeyDerivationFailed**: HMAC-based derivation of a caller or shared key failed
//! - **EncryptionFailed**: Sealing outbound call data failed (includes low-order node keys)
//! - **DecryptionFailed**: AEAD authentication failed (wrong key pair, corrupted response)
//! - **InvalidEnvelope**: Wire payload is too short or malformed
//!
//! ## Usage Example
//!
//! ```rust
//! use shielded_rpc::crypto::CryptoError;
//!
//! fn open_response(ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
//!     Err(CryptoError::DecryptionFailed {
//!         operation: "node_response".to_string(),
//!         reason: "authentication tag mismatch".to_string(),
//!     })
//! }
//! ```

use std::fmt;

/// Error type for all envelope cryptography
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid cryptographic key
    ///
    /// This error occurs when:
    /// - Key has wrong length
    /// - Key is not valid hex
    InvalidKey {
        /// Type of key that failed (e.g., "node_public_key", "private_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Key derivation failed
    KeyDerivationFailed {
        /// Which key derivation operation failed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Encryption of outbound data failed
    ///
    /// This error occurs when:
    /// - The node public key is a low-order point (non-contributory ECDH)
    /// - The AEAD refuses to seal the payload
    EncryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// AEAD decryption failed
    ///
    /// This error occurs when:
    /// - Authentication tag verification fails (ciphertext tampered or wrong key pair)
    /// - The response was never encrypted for this caller
    DecryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// Envelope or sealed payload has an invalid layout
    InvalidEnvelope {
        /// Minimum accepted size in bytes
        expected_min: usize,
        /// Actual size provided
        actual: usize,
    },
}

impl CryptoError {
    /// Whether this error was raised while sealing outbound data
    pub fn is_encryption(&self) -> bool {
        matches!(self, CryptoError::EncryptionFailed { .. })
    }

    /// Whether this error was raised while opening inbound data
    pub fn is_decryption(&self) -> bool {
        matches!(
            self,
            CryptoError::DecryptionFailed { .. } | CryptoError::InvalidEnvelope { .. }
        )
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::KeyDerivationFailed { operation, reason } => {
                write!(f, "Key derivation failed during {}: {}", operation, reason)
            }
            CryptoError::EncryptionFailed { operation, reason } => {
                write!(f, "Encryption failed during {}: {}", operation, reason)
            }
            CryptoError::DecryptionFailed { operation, reason } => {
                write!(f, "Decryption failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidEnvelope {
                expected_min,
                actual,
            } => {
                write!(
                    f,
                    "Invalid envelope: expected at least {} bytes, got {} bytes",
                    expected_min, actual
                )
            }
        }
    }
}

impl std::error::Error for CryptoError {}

// Conversion from hex decode errors
impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidKey {
            key_type: "hex_key".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}
