// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use shielded_rpc::crypto::key_derivation::hmac_derive;
use shielded_rpc::crypto::{
    derive_encryption_key, CallerSecret, CryptoError, PrivateKey, IO_KEY_PREFIX, USER_KEY_PREFIX,
};

const KEY_HEX: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[test]
fn test_derivation_is_deterministic() {
    let secret = [0x11u8; 32];
    let first = derive_encryption_key(&secret, USER_KEY_PREFIX).unwrap();
    let second = derive_encryption_key(&secret, USER_KEY_PREFIX).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.public_key(), second.public_key());
}

#[test]
fn test_domain_prefix_separates_keys() {
    let secret = [0x11u8; 32];
    let user = derive_encryption_key(&secret, USER_KEY_PREFIX).unwrap();
    let io = derive_encryption_key(&secret, IO_KEY_PREFIX).unwrap();
    assert_ne!(user.public_key(), io.public_key());
}

#[test]
fn test_hmac_known_vector() {
    // HMAC-SHA256(key = "test", msg = 32 zero bytes)
    let derived = hmac_derive(&[0u8; 32], b"test").unwrap();
    assert_eq!(
        hex::encode(derived),
        "19c3288df186addcbf1a9fbab4e4be48aaa7d8468a955eea3326f5a63807142a"
    );
}

#[test]
fn test_prefixed_and_bare_private_keys_derive_same_key() {
    let bare: PrivateKey = KEY_HEX.parse().unwrap();
    let prefixed: PrivateKey = format!("0x{}", KEY_HEX).parse().unwrap();

    let from_bare = CallerSecret::PrivateKey(bare).derive().unwrap();
    let from_prefixed = CallerSecret::PrivateKey(prefixed).derive().unwrap();
    assert_eq!(from_bare, from_prefixed);
}

#[test]
fn test_random_secret_is_fresh_each_time() {
    let first = CallerSecret::Random.derive().unwrap();
    let second = CallerSecret::Random.derive().unwrap();
    assert_ne!(first.public_key(), second.public_key());
}

#[test]
fn test_empty_secret_rejected() {
    let result = derive_encryption_key(&[], USER_KEY_PREFIX);
    assert!(matches!(result, Err(CryptoError::KeyDerivationFailed { .. })));
}

#[test]
fn test_private_key_must_be_32_bytes() {
    let err = "0x1234".parse::<PrivateKey>().unwrap_err();
    assert!(matches!(err, CryptoError::InvalidKey { .. }));
    assert!(err.to_string().contains("64 hex characters"));
}
