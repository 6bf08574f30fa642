// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::abi::Token;
use ethers::types::U256;
use shielded_rpc::client::ClientConfig;
use shielded_rpc::{CallerSecret, ShieldedCall, ShieldedError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::common::{
    abi_call, address_of, client, contract, decode_uint, key, MockNode, ALICE_KEY,
    REVERT_TOO_LOW,
};

#[tokio::test]
async fn test_query_returns_decrypted_output() {
    let node = Arc::new(MockNode::new().with_balance(address_of(ALICE_KEY), 500));
    let client = client(&node);

    let output = client
        .send_shielded_query(ShieldedCall::new(
            contract(),
            abi_call("balanceOf(address)", &[Token::Address(address_of(ALICE_KEY))]),
        ))
        .await
        .unwrap();

    assert_eq!(decode_uint(&output), U256::from(500));
}

#[tokio::test]
async fn test_query_does_not_mutate_state() {
    let node = Arc::new(MockNode::new());
    let client = client(&node);

    // add() through the read-only path runs against a scratch copy
    client
        .send_shielded_query(ShieldedCall::new(contract(), abi_call("add()", &[])))
        .await
        .unwrap();

    let output = client
        .send_shielded_query(ShieldedCall::new(contract(), abi_call("counter()", &[])))
        .await
        .unwrap();
    assert_eq!(decode_uint(&output), U256::zero());
    assert_eq!(node.counter(), U256::zero());
}

#[tokio::test]
async fn test_revert_passes_through_without_decryption() {
    let node = Arc::new(MockNode::new());
    let client = client(&node);

    let err = client
        .send_shielded_query(ShieldedCall::new(contract(), abi_call("subtract()", &[])))
        .await
        .unwrap_err();

    match &err {
        ShieldedError::Reverted(payload) => {
            assert_eq!(payload.reason(), Some(REVERT_TOO_LOW));
            assert_eq!(&payload.raw()[..4], &[0x08, 0xc3, 0x79, 0xa0]);
        }
        other => panic!("Expected Reverted, got {:?}", other),
    }
    assert!(err.to_string().contains("reverted"));
    assert!(err.to_string().contains(REVERT_TOO_LOW));
}

#[tokio::test]
async fn test_query_with_stable_encryption_key() {
    let node = Arc::new(MockNode::new());
    let client = client(&node);

    for secret in [
        CallerSecret::PrivateKey(key(ALICE_KEY)),
        CallerSecret::PrivateKey(key(ALICE_KEY.trim_start_matches("0x"))),
        CallerSecret::Random,
    ] {
        let output = client
            .send_shielded_query(
                ShieldedCall::new(contract(), abi_call("counter()", &[])).caller_secret(secret),
            )
            .await
            .unwrap();
        assert_eq!(decode_uint(&output), U256::zero());
    }
}

#[tokio::test]
async fn test_cancelled_query_is_abandoned() {
    let node = Arc::new(MockNode::new().with_latency(Duration::from_secs(5)));
    let client = client(&node);

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = client
        .send_shielded_query(
            ShieldedCall::new(contract(), abi_call("counter()", &[])).with_cancellation(token),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ShieldedError::Cancelled));
}

#[tokio::test]
async fn test_slow_query_times_out() {
    let node = Arc::new(MockNode::new().with_latency(Duration::from_secs(5)));
    let client = client(&node).with_config(ClientConfig {
        request_timeout: Some(Duration::from_millis(50)),
        ..ClientConfig::default()
    });

    let err = client
        .send_shielded_query(ShieldedCall::new(contract(), abi_call("counter()", &[])))
        .await
        .unwrap_err();

    match err {
        ShieldedError::Timeout(limit) => assert_eq!(limit, Duration::from_millis(50)),
        other => panic!("Expected Timeout, got {:?}", other),
    }
}
