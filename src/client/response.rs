// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query response classification
//!
//! When a shielded call reverts, the node returns the standard ABI
//! `Error(string)` payload in plaintext rather than a sealed response. The
//! client must recognize it before trying to decrypt.

use ethers::abi::{decode, ParamType, Token};
use ethers::types::Bytes;
use std::fmt;

/// Selector of the ABI `Error(string)` revert payload
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// What kind of payload the node returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeResponse {
    /// No output at all (e.g. call to an account without code)
    Empty,
    /// Sealed output to decrypt
    Encrypted,
    /// Plaintext ABI revert reason
    PlainRevert,
}

/// Decides how a raw query response should be handled
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, response: &[u8]) -> NodeResponse;
}

/// Recognizes reverts by the `0x08c379a0` selector prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct RevertSelectorClassifier;

impl ResponseClassifier for RevertSelectorClassifier {
    fn classify(&self, response: &[u8]) -> NodeResponse {
        if response.is_empty() {
            NodeResponse::Empty
        } else if response.starts_with(&REVERT_SELECTOR) {
            NodeResponse::PlainRevert
        } else {
            NodeResponse::Encrypted
        }
    }
}

/// Plaintext revert returned in place of an encrypted response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPayload {
    raw: Bytes,
    reason: Option<String>,
}

impl RevertPayload {
    pub fn new(raw: Bytes) -> Self {
        let reason = decode_revert_reason(&raw);
        Self { raw, reason }
    }

    /// The untouched bytes the node returned
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Decoded `Error(string)` message, if the payload is well formed
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Display for RevertPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "execution reverted: {}", reason),
            None => write!(f, "execution reverted: {}", self.raw),
        }
    }
}

/// Decode the string argument of an `Error(string)` payload
pub fn decode_revert_reason(payload: &[u8]) -> Option<String> {
    let body = payload.strip_prefix(&REVERT_SELECTOR[..])?;
    match decode(&[ParamType::String], body).ok()?.into_iter().next()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}
