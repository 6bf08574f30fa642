// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ShieldedConfig, ENV_PRIVATE_KEY, ENV_RPC_URL};

/// Shielded RPC CLI
#[derive(Parser, Debug)]
#[command(name = "shielded-cli")]
#[command(version)]
#[command(about = "Send confidential calls and transactions to a privacy-preserving EVM node", long_about = None)]
pub struct Cli {
    /// TOML config file (environment variables are used otherwise)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Node JSON-RPC URL
    #[arg(long, global = true, env = ENV_RPC_URL)]
    pub rpc_url: Option<String>,

    /// Private key for signing (can also be set via SHIELDED_PRIVATE_KEY env var)
    #[arg(long, global = true, env = ENV_PRIVATE_KEY, hide_env_values = true)]
    pub private_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the node's encryption public key
    NodeKey(commands::NodeKeyArgs),

    /// Encrypted read-only call
    Query(commands::CallArgs),

    /// Encrypted state-changing transaction
    Send(commands::SendArgs),

    /// Encrypted read-only call signed by the configured key
    SignedQuery(commands::CallArgs),

    /// Print version and feature information as JSON
    Version,
}

impl Cli {
    /// Config file or environment, with flags taking precedence
    pub fn load_config(&self) -> Result<ShieldedConfig> {
        let mut config = match &self.config {
            Some(path) => ShieldedConfig::from_toml_file(path)?,
            None => ShieldedConfig::from_env()?,
        };

        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(private_key) = &self.private_key {
            config.private_key = Some(private_key.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    if matches!(cli.command, Commands::Version) {
        return commands::version();
    }

    let config = cli.load_config()?;

    match cli.command {
        Commands::NodeKey(args) => commands::node_key(&config, args).await,
        Commands::Query(args) => commands::query(&config, args).await,
        Commands::Send(args) => commands::send(&config, args).await,
        Commands::SignedQuery(args) => commands::signed_query(&config, args).await,
        Commands::Version => commands::version(),
    }
}
