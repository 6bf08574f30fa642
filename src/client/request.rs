// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, Bytes, U256};
use tokio_util::sync::CancellationToken;

use crate::crypto::{CallerSecret, PrivateKey};

/// One shielded call or transaction
///
/// `data` is ABI-encoded call data; it is encrypted before it leaves the
/// process.
///
/// # Example
///
/// ```ignore
/// let call = ShieldedCall::new(counter, add_selector)
///     .value(U256::zero())
///     .with_cancellation(token.clone());
/// ```
#[derive(Debug, Clone)]
pub struct ShieldedCall {
    pub(crate) to: Address,
    pub(crate) data: Bytes,
    pub(crate) value: Option<U256>,
    pub(crate) gas: Option<U256>,
    pub(crate) caller_secret: Option<CallerSecret>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl ShieldedCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: None,
            gas: None,
            caller_secret: None,
            cancellation: None,
        }
    }

    /// Native value to transfer (transactions only)
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Gas limit; estimated by the node when unset
    pub fn gas(mut self, gas: U256) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Key source for the envelope
    ///
    /// Queries default to a fresh random key. Transactions default to the
    /// client wallet's private key.
    pub fn caller_secret(mut self, secret: CallerSecret) -> Self {
        self.caller_secret = Some(secret);
        self
    }

    /// Shorthand for `caller_secret(CallerSecret::PrivateKey(key))`
    pub fn encryption_key(self, key: PrivateKey) -> Self {
        self.caller_secret(CallerSecret::PrivateKey(key))
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
