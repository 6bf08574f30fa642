// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{TransactionReceipt, H256, U64};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{Result, ShieldedError};
use crate::rpc::NodeTransport;

/// Handle to a submitted shielded transaction
///
/// Receipts are plain chain data; nothing is decrypted on this path.
#[derive(Clone)]
pub struct PendingShieldedTransaction {
    tx_hash: H256,
    transport: Arc<dyn NodeTransport>,
    poll_interval: Duration,
    timeout: Duration,
}

impl PendingShieldedTransaction {
    pub(crate) fn new(
        tx_hash: H256,
        transport: Arc<dyn NodeTransport>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            tx_hash,
            transport,
            poll_interval,
            timeout,
        }
    }

    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    /// Poll until the transaction is mined
    ///
    /// # Errors
    ///
    /// - `TransactionReverted` if the receipt status is 0
    /// - `Timeout` if no receipt shows up within the receipt timeout
    /// - `Transport` if polling fails
    pub async fn wait(&self) -> Result<TransactionReceipt> {
        let started = Instant::now();

        loop {
            if let Some(receipt) = self.transport.transaction_receipt(self.tx_hash).await? {
                if receipt.status == Some(U64::zero()) {
                    warn!(tx_hash = ?self.tx_hash, "❌ Shielded transaction reverted");
                    return Err(ShieldedError::TransactionReverted {
                        tx_hash: self.tx_hash,
                    });
                }

                info!(
                    tx_hash = ?self.tx_hash,
                    block = ?receipt.block_number,
                    gas_used = ?receipt.gas_used,
                    "✅ Shielded transaction mined"
                );
                return Ok(receipt);
            }

            if started.elapsed() >= self.timeout {
                return Err(ShieldedError::Timeout(self.timeout));
            }

            debug!(tx_hash = ?self.tx_hash, "receipt not available yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl fmt::Debug for PendingShieldedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingShieldedTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}
