// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller Private Key Parsing
//!
//! Private keys reach the client from environment variables, config files and
//! CLI flags, sometimes with a `0x` prefix and sometimes without. Everything is
//! normalized here, once, into a raw 32-byte [`PrivateKey`]. The same value
//! feeds both the signing wallet and encryption-key derivation, so the two can
//! never disagree about what the key bytes are.
//!
//! ## Security Considerations
//!
//! - `Debug` output is redacted
//! - Key is NEVER logged

use super::CryptoError;
use ethers::signers::LocalWallet;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Length of a secp256k1 / x25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// A caller's 32-byte private key in canonical form (no prefix, raw bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey([u8; PRIVATE_KEY_SIZE]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.0
    }

    /// Read a private key from the named environment variable
    ///
    /// Accepts the key with or without the `0x` prefix.
    pub fn from_env(var: &str) -> Result<Self, CryptoError> {
        let raw = env::var(var).map_err(|_| CryptoError::InvalidKey {
            key_type: "private_key".to_string(),
            reason: format!("{} environment variable not set", var),
        })?;

        let key = raw.parse::<PrivateKey>()?;

        // Log success WITHOUT logging the actual key
        info!("✅ Private key loaded from {} (32 bytes)", var);
        Ok(key)
    }

    /// Build an ethers wallet bound to `chain_id` from this key
    pub fn to_wallet(&self, chain_id: u64) -> Result<LocalWallet, CryptoError> {
        use ethers::signers::Signer;

        let wallet = LocalWallet::from_bytes(&self.0).map_err(|e| CryptoError::InvalidKey {
            key_type: "private_key".to_string(),
            reason: format!("not a valid secp256k1 scalar: {}", e),
        })?;
        Ok(wallet.with_chain_id(chain_id))
    }
}

/// Strip whitespace and an optional `0x`/`0X` prefix
pub fn normalize_hex(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_str = normalize_hex(s);

        if hex_str.is_empty() {
            return Err(CryptoError::InvalidKey {
                key_type: "private_key".to_string(),
                reason: "private key is empty".to_string(),
            });
        }

        // Validate length (should be 64 hex chars = 32 bytes)
        if hex_str.len() != PRIVATE_KEY_SIZE * 2 {
            return Err(CryptoError::InvalidKey {
                key_type: "private_key".to_string(),
                reason: format!(
                    "must be exactly 64 hex characters (32 bytes), got {} characters",
                    hex_str.len()
                ),
            });
        }

        let mut key = [0u8; PRIVATE_KEY_SIZE];
        hex::decode_to_slice(hex_str, &mut key)?;
        Ok(Self(key))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}
