// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use ethers::types::{Address, Bytes, U256};
use std::str::FromStr;
use tracing::info;

use crate::client::{ShieldedCall, ShieldedRpcClient};
use crate::config::ShieldedConfig;
use crate::crypto::{normalize_hex, PrivateKey};
use crate::version;

/// Arguments for node-key command
#[derive(Args, Debug)]
pub struct NodeKeyArgs {
    /// Skip the cache and fetch the key again
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments shared by query and signed-query
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Contract address
    #[arg(long)]
    pub to: String,

    /// ABI-encoded call data as hex
    #[arg(long)]
    pub data: String,

    /// Value in wei (decimal)
    #[arg(long)]
    pub value: Option<String>,

    /// Private key for the envelope (random per call when omitted)
    #[arg(long)]
    pub encryption_key: Option<String>,
}

/// Arguments for send command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Contract address
    #[arg(long)]
    pub to: String,

    /// ABI-encoded call data as hex
    #[arg(long)]
    pub data: String,

    /// Value in wei (decimal)
    #[arg(long)]
    pub value: Option<String>,

    /// Print the hash and return without waiting for the receipt
    #[arg(long)]
    pub no_wait: bool,
}

/// Print the node public key
pub async fn node_key(config: &ShieldedConfig, args: NodeKeyArgs) -> Result<()> {
    let client = ShieldedRpcClient::from_config(config)?;

    let key = if args.refresh {
        client.refresh_node_key().await?
    } else {
        client.node_public_key().await?
    };

    println!("🔑 Node public key: {}", key.to_hex());
    println!("   Endpoint:        {}", key.source_endpoint());
    Ok(())
}

/// Encrypted read-only call
pub async fn query(config: &ShieldedConfig, args: CallArgs) -> Result<()> {
    let client = ShieldedRpcClient::from_config(config)?;
    let call = build_call(&args.to, &args.data, args.value.as_deref(), args.encryption_key.as_deref())?;

    let output = client.send_shielded_query(call).await?;
    println!("✅ Output: {}", output);
    Ok(())
}

/// Encrypted transaction, optionally waiting for the receipt
pub async fn send(config: &ShieldedConfig, args: SendArgs) -> Result<()> {
    let client = ShieldedRpcClient::from_config(config)?;
    let call = build_call(&args.to, &args.data, args.value.as_deref(), None)?;

    let pending = client.send_shielded_transaction(call).await?;
    println!("📤 Transaction submitted: {:?}", pending.tx_hash());

    if args.no_wait {
        return Ok(());
    }

    info!(tx_hash = ?pending.tx_hash(), "waiting for receipt");
    let receipt = pending.wait().await?;
    println!("✅ Mined in block {:?}", receipt.block_number);
    println!("   Gas used: {:?}", receipt.gas_used);
    Ok(())
}

/// Encrypted read-only call carrying a signature
pub async fn signed_query(config: &ShieldedConfig, args: CallArgs) -> Result<()> {
    let client = ShieldedRpcClient::from_config(config)?;
    let call = build_call(&args.to, &args.data, args.value.as_deref(), args.encryption_key.as_deref())?;

    let output = client.send_signed_shielded_query(call).await?;
    println!("✅ Output: {}", output);
    Ok(())
}

/// Version and feature list, as JSON
pub fn version() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
    Ok(())
}

/// Parse raw CLI strings into a call
pub fn build_call(
    to: &str,
    data: &str,
    value: Option<&str>,
    encryption_key: Option<&str>,
) -> Result<ShieldedCall> {
    let to = Address::from_str(to).map_err(|e| anyhow!("Invalid address '{}': {}", to, e))?;
    let data = Bytes::from(hex::decode(normalize_hex(data)).context("Call data must be hex")?);

    let mut call = ShieldedCall::new(to, data);
    if let Some(value) = value {
        let value = U256::from_dec_str(value).map_err(|e| anyhow!("Invalid value '{}': {}", value, e))?;
        call = call.value(value);
    }
    if let Some(key) = encryption_key {
        let key = PrivateKey::from_str(key).map_err(|e| anyhow!("Invalid encryption key: {}", e))?;
        call = call.encryption_key(key);
    }

    Ok(call)
}
