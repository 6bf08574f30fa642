// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller Key Derivation
//!
//! Turns a private key (or a fresh random seed) into the x25519 secret used for
//! envelope ECDH. Derivation is `HMAC-SHA256(key = prefix, msg = secret)` and is
//! fully deterministic: the same private key always yields the same
//! encryption key, which is what lets a caller open a response later.

use super::{CryptoError, PrivateKey};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};

/// Domain-separation prefix for caller encryption keys
pub const USER_KEY_PREFIX: &[u8] = b"UserEncryptionKeyV1";

/// Domain-separation prefix for the envelope AEAD key derived from ECDH output
pub const IO_KEY_PREFIX: &[u8] = b"IOEncryptionKeyV1";

/// Size of a derived key in bytes
pub const DERIVED_KEY_SIZE: usize = 32;

/// HMAC-SHA256 keyed by `info`, over `secret`
pub fn hmac_derive(secret: &[u8], info: &[u8]) -> Result<[u8; DERIVED_KEY_SIZE], CryptoError> {
    let mut kdf = <Hmac<Sha256> as Mac>::new_from_slice(info).map_err(|e| {
        CryptoError::KeyDerivationFailed {
            operation: "hmac_sha256".to_string(),
            reason: e.to_string(),
        }
    })?;
    kdf.update(secret);

    let mut derived = [0u8; DERIVED_KEY_SIZE];
    derived.copy_from_slice(&kdf.finalize().into_bytes()[..DERIVED_KEY_SIZE]);
    Ok(derived)
}

/// Derive caller key material from `secret_material` under `domain_prefix`
pub fn derive_encryption_key(
    secret_material: &[u8],
    domain_prefix: &[u8],
) -> Result<CallerKeyMaterial, CryptoError> {
    if secret_material.is_empty() {
        return Err(CryptoError::KeyDerivationFailed {
            operation: "derive_encryption_key".to_string(),
            reason: "secret material is empty".to_string(),
        });
    }

    let derived = hmac_derive(secret_material, domain_prefix)?;
    Ok(CallerKeyMaterial::from_secret(derived))
}

/// x25519 key pair a caller uses for one or more envelopes
#[derive(Clone)]
pub struct CallerKeyMaterial {
    secret: StaticSecret,
    public: PublicKey,
}

impl CallerKeyMaterial {
    /// Wrap an already-derived 32-byte secret
    pub fn from_secret(secret: [u8; DERIVED_KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Derive from a fresh random 32-byte seed
    pub fn random() -> Result<Self, CryptoError> {
        let mut seed = [0u8; DERIVED_KEY_SIZE];
        OsRng.fill_bytes(&mut seed);
        derive_encryption_key(&seed, USER_KEY_PREFIX)
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

impl PartialEq for CallerKeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.secret.to_bytes() == other.secret.to_bytes()
    }
}

impl Eq for CallerKeyMaterial {}

impl fmt::Debug for CallerKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerKeyMaterial")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// Where a call's encryption key comes from
#[derive(Debug, Clone, Default)]
pub enum CallerSecret {
    /// Fresh random seed per call (anonymous queries)
    #[default]
    Random,
    /// Stable key derived from the caller's private key
    PrivateKey(PrivateKey),
}

impl CallerSecret {
    /// Produce key material for one call
    pub fn derive(&self) -> Result<CallerKeyMaterial, CryptoError> {
        match self {
            CallerSecret::Random => CallerKeyMaterial::random(),
            CallerSecret::PrivateKey(key) => derive_encryption_key(key.as_bytes(), USER_KEY_PREFIX),
        }
    }
}

impl From<PrivateKey> for CallerSecret {
    fn from(key: PrivateKey) -> Self {
        CallerSecret::PrivateKey(key)
    }
}
