// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process confidential node used by the integration tests
//!
//! Opens request envelopes with its own x25519 key, runs a tiny counter and
//! ERC20 model, and seals query output back to the caller.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::providers::ProviderError;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Signature, TransactionReceipt, TransactionRequest, H256, U256, U64,
};
use ethers::utils::{id, keccak256, rlp::Rlp};
use shielded_rpc::client::{ClientConfig, REVERT_SELECTOR};
use shielded_rpc::crypto::{CallerKeyMaterial, Envelope, SharedCipher};
use shielded_rpc::rpc::{NodeKeyResponse, NodeKeySource, NodeTransport, SignedCallRequest};
use shielded_rpc::{PrivateKey, ShieldedRpcClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ENDPOINT: &str = "http://mock-node:8545";
pub const CHAIN_ID: u64 = 1291;
pub const REVERT_TOO_LOW: &str = "COUNTER_TOO_LOW";
pub const REVERT_BALANCE: &str = "ERC20: transfer amount exceeds balance";

/// Hardhat/anvil account #0
pub const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Hardhat/anvil account #1, given without prefix on purpose
pub const BOB_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn contract() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn key(raw: &str) -> PrivateKey {
    raw.parse().expect("test key")
}

pub fn address_of(raw: &str) -> Address {
    use ethers::signers::Signer;
    key(raw).to_wallet(CHAIN_ID).expect("wallet").address()
}

/// ABI-encode a call: selector of `signature` followed by `args`
pub fn abi_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = id(signature).to_vec();
    data.extend(encode(args));
    data
}

pub fn decode_uint(output: &[u8]) -> U256 {
    match decode(&[ParamType::Uint(256)], output).expect("uint output").remove(0) {
        Token::Uint(value) => value,
        other => panic!("Expected uint, got {:?}", other),
    }
}

fn revert_payload(reason: &str) -> Vec<u8> {
    let mut out = REVERT_SELECTOR.to_vec();
    out.extend(encode(&[Token::String(reason.to_string())]));
    out
}

#[derive(Debug, Clone, Default)]
struct ChainState {
    counter: U256,
    balances: HashMap<Address, U256>,
}

impl ChainState {
    /// Run one call; `Err` carries the revert reason
    fn execute(&mut self, sender: Option<Address>, input: &[u8]) -> Result<Vec<u8>, String> {
        if input.len() < 4 {
            return Err("missing selector".to_string());
        }
        let (selector, args) = input.split_at(4);

        if selector == id("counter()") {
            Ok(encode(&[Token::Uint(self.counter)]))
        } else if selector == id("add()") {
            self.counter += U256::one();
            Ok(Vec::new())
        } else if selector == id("subtract()") {
            if self.counter.is_zero() {
                return Err(REVERT_TOO_LOW.to_string());
            }
            self.counter -= U256::one();
            Ok(Vec::new())
        } else if selector == id("balanceOf(address)") {
            let owner = decode_address(args)?;
            Ok(encode(&[Token::Uint(self.balance(owner))]))
        } else if selector == id("myBalance()") {
            let owner = sender.ok_or("sender unknown")?;
            Ok(encode(&[Token::Uint(self.balance(owner))]))
        } else if selector == id("transfer(address,uint256)") {
            let from = sender.ok_or("sender unknown")?;
            let tokens = decode(&[ParamType::Address, ParamType::Uint(256)], args)
                .map_err(|e| e.to_string())?;
            let (to, amount) = match (&tokens[0], &tokens[1]) {
                (Token::Address(to), Token::Uint(amount)) => (*to, *amount),
                _ => return Err("bad transfer arguments".to_string()),
            };
            if self.balance(from) < amount {
                return Err(REVERT_BALANCE.to_string());
            }
            self.balances.insert(from, self.balance(from) - amount);
            self.balances.insert(to, self.balance(to) + amount);
            Ok(encode(&[Token::Bool(true)]))
        } else {
            Err("unknown selector".to_string())
        }
    }

    fn balance(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }
}

fn decode_address(args: &[u8]) -> Result<Address, String> {
    match decode(&[ParamType::Address], args).map_err(|e| e.to_string())?.remove(0) {
        Token::Address(address) => Ok(address),
        _ => Err("bad address argument".to_string()),
    }
}

#[derive(Default)]
struct Ledger {
    nonces: HashMap<Address, U256>,
    receipts: HashMap<H256, TransactionReceipt>,
    polled: HashMap<H256, usize>,
    block: u64,
}

pub struct MockNode {
    key: Mutex<CallerKeyMaterial>,
    key_error: Mutex<Option<String>>,
    state: Mutex<ChainState>,
    ledger: Mutex<Ledger>,
    key_fetches: AtomicUsize,
    calls: AtomicUsize,
    chain_id_requests: AtomicUsize,
    latency: Duration,
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            key: Mutex::new(CallerKeyMaterial::from_secret([0x5a; 32])),
            key_error: Mutex::new(None),
            state: Mutex::new(ChainState::default()),
            ledger: Mutex::new(Ledger::default()),
            key_fetches: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            chain_id_requests: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_balance(self, owner: Address, amount: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(owner, U256::from(amount));
        self
    }

    /// Answer key requests with a JSON-RPC error instead of a key
    pub fn refuse_key(&self, message: &str) {
        *self.key_error.lock().unwrap() = Some(message.to_string());
    }

    /// Replace the node key, as an enclave restart would
    pub fn rotate_key(&self, secret: [u8; 32]) {
        *self.key.lock().unwrap() = CallerKeyMaterial::from_secret(secret);
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.lock().unwrap().public_key()
    }

    pub fn key_fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn chain_id_requests(&self) -> usize {
        self.chain_id_requests.load(Ordering::SeqCst)
    }

    pub fn counter(&self) -> U256 {
        self.state.lock().unwrap().counter
    }

    pub fn balance(&self, owner: Address) -> U256 {
        self.state.lock().unwrap().balance(owner)
    }

    fn cipher_for(&self, data: &[u8]) -> Result<(SharedCipher, Vec<u8>), ProviderError> {
        let envelope = Envelope::from_bytes(data).map_err(node_error)?;
        let node_key = self.key.lock().unwrap().clone();
        let cipher =
            SharedCipher::establish(&node_key, &envelope.sender_public_key).map_err(node_error)?;
        let plaintext = cipher.open(&envelope.sealed).map_err(node_error)?;
        Ok((cipher, plaintext))
    }

    /// Execute against a copy of the state and seal the output
    fn query(&self, data: &[u8], sender: Option<Address>) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (cipher, input) = self.cipher_for(data)?;

        let mut scratch = self.state.lock().unwrap().clone();
        match scratch.execute(sender, &input) {
            Ok(output) => {
                let sealed = cipher.seal(&output).map_err(node_error)?;
                Ok(Bytes::from(sealed.to_bytes()))
            }
            Err(reason) => Ok(Bytes::from(revert_payload(&reason))),
        }
    }
}

fn node_error(err: impl std::fmt::Display) -> ProviderError {
    ProviderError::CustomError(format!("node rejected envelope: {}", err))
}

#[async_trait]
impl NodeKeySource for MockNode {
    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }

    async fn fetch_node_public_key(&self) -> Result<NodeKeyResponse, ProviderError> {
        self.key_fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(message) = self.key_error.lock().unwrap().clone() {
            return Ok(NodeKeyResponse::error(message));
        }
        Ok(NodeKeyResponse::key(format!(
            "0x{}",
            hex::encode(self.public_key())
        )))
    }
}

#[async_trait]
impl NodeTransport for MockNode {
    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.chain_id_requests.fetch_add(1, Ordering::SeqCst);
        Ok(CHAIN_ID)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ProviderError> {
        tokio::time::sleep(self.latency).await;
        let data = tx.data().cloned().unwrap_or_default();
        self.query(&data, tx.from().copied())
    }

    async fn signed_call(&self, request: &SignedCallRequest) -> Result<Bytes, ProviderError> {
        let unsigned: TypedTransaction = TransactionRequest::new()
            .to(request.to)
            .data(request.data.clone())
            .chain_id(request.chain_id)
            .into();
        let signature = Signature {
            r: request.r,
            s: request.s,
            v: request.v.as_u64(),
        };
        let sender = signature
            .recover(unsigned.sighash())
            .map_err(|e| ProviderError::CustomError(format!("bad signature: {}", e)))?;

        self.query(&request.data, Some(sender))
    }

    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<(), ProviderError> {
        let from = tx.from().copied().unwrap_or_default();
        if tx.nonce().is_none() {
            let nonce = self
                .ledger
                .lock()
                .unwrap()
                .nonces
                .get(&from)
                .copied()
                .unwrap_or_default();
            tx.set_nonce(nonce);
        }
        if tx.gas().is_none() {
            tx.set_gas(U256::from(300_000u64));
        }
        if tx.gas_price().is_none() {
            tx.set_gas_price(U256::from(1_000_000_000u64));
        }
        if tx.chain_id().is_none() {
            tx.set_chain_id(CHAIN_ID);
        }
        Ok(())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ProviderError> {
        let rlp = Rlp::new(raw.as_ref());
        let (tx, signature) = TypedTransaction::decode_signed(&rlp)
            .map_err(|e| ProviderError::CustomError(format!("bad raw transaction: {}", e)))?;
        let sender = signature
            .recover(tx.sighash())
            .map_err(|e| ProviderError::CustomError(format!("bad signature: {}", e)))?;

        let data = tx.data().cloned().unwrap_or_default();
        let (_, input) = self.cipher_for(&data)?;

        let status = {
            let mut state = self.state.lock().unwrap();
            let mut next = state.clone();
            match next.execute(Some(sender), &input) {
                Ok(_) => {
                    *state = next;
                    1u64
                }
                Err(_) => 0u64,
            }
        };

        let tx_hash = H256::from(keccak256(raw.as_ref()));
        let mut ledger = self.ledger.lock().unwrap();
        ledger.block += 1;
        let nonce = ledger.nonces.entry(sender).or_default();
        *nonce += U256::one();

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            from: sender,
            to: tx.to_addr().copied(),
            block_number: Some(U64::from(ledger.block)),
            gas_used: Some(U256::from(50_000u64)),
            status: Some(U64::from(status)),
            ..Default::default()
        };
        ledger.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let mut ledger = self.ledger.lock().unwrap();
        // First poll sees the transaction as pending
        let polls = ledger.polled.entry(tx_hash).or_default();
        *polls += 1;
        if *polls == 1 {
            return Ok(None);
        }
        Ok(ledger.receipts.get(&tx_hash).cloned())
    }
}

pub fn fast_config() -> ClientConfig {
    ClientConfig {
        chain_id: None,
        request_timeout: Some(Duration::from_secs(5)),
        receipt_poll_interval: Duration::from_millis(10),
        receipt_timeout: Duration::from_secs(2),
    }
}

/// Client without a wallet against `node`
pub fn client(node: &Arc<MockNode>) -> ShieldedRpcClient {
    ShieldedRpcClient::new(node.clone()).with_config(fast_config())
}

/// Client signing with `raw_key`
pub fn client_with_wallet(node: &Arc<MockNode>, raw_key: &str) -> ShieldedRpcClient {
    client(node).with_wallet(key(raw_key))
}
