// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Envelope Encryption Module
//!
//! This module implements the cryptographic primitives behind shielded calls
//! and transactions:
//!
//! - **Private keys**: one canonical 32-byte form regardless of `0x` prefix
//! - **Key derivation**: HMAC-SHA256 with fixed domain-separation prefixes
//! - **ECDH**: x25519 agreement between caller key and node public key
//! - **Encryption**: Deoxys-II-256-128 AEAD with on-wire nonce and ad
//! - **Envelope**: framing of the caller public key and sealed payload
//!
//! ## Security Considerations
//!
//! - Private keys and derived secrets are never logged
//! - Nonces are random per seal
//! - Low-order node keys are rejected before any data is sealed
//!
//! ## Protocol Flow
//!
//! 1. Caller derives an x25519 key from its private key or a random seed
//! 2. Caller performs ECDH with the node public key and derives the AEAD key
//! 3. Caller seals the call data and prepends its public key
//! 4. Node re-derives the same AEAD key from the prepended public key
//! 5. Node seals the call output under that key
//! 6. Caller opens the response with the key material from step 1

pub mod ecdh;
pub mod encryption;
pub mod envelope;
pub mod error;
pub mod key_derivation;
pub mod private_key;

pub use ecdh::{derive_shared_key, parse_public_key, SharedCipher, PUBLIC_KEY_SIZE};
pub use encryption::{open_with_deoxys, seal_with_deoxys, SealedPayload};
pub use envelope::{Envelope, EnvelopeCodec};
pub use error::CryptoError;
pub use key_derivation::{
    derive_encryption_key, CallerKeyMaterial, CallerSecret, IO_KEY_PREFIX, USER_KEY_PREFIX,
};
pub use private_key::{normalize_hex, PrivateKey};
