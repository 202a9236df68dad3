// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::rpc::{BlockchainRpc, RpcError};
use crate::settings::Settings;
use async_trait::async_trait;
use log::*;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_CONFIRM_ATTEMPTS: u16 = 60;

/// Node client over JSON-RPC.
pub struct HttpRpcClient {
    client: RpcClient,
    url: String,
    poll_interval: Duration,
    max_attempts: u16,
}

impl fmt::Debug for HttpRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRpcClient")
            .field("url", &self.url)
            .field("poll_interval", &self.poll_interval)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();

        Self {
            client: RpcClient::new_with_commitment(url.clone(), CommitmentConfig::confirmed()),
            url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_CONFIRM_ATTEMPTS,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.client.rpc_url(&settings.presale.network_name)).with_confirmation(
            Duration::from_millis(settings.client.confirm_poll_interval_ms),
            settings.client.confirm_max_attempts,
        )
    }

    /// Sets how often and how many times signature statuses are queried.
    pub fn with_confirmation(mut self, poll_interval: Duration, max_attempts: u16) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BlockchainRpc for HttpRpcClient {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let signature = self.client.send_transaction(transaction).await?;
        trace!("Node accepted transaction {}", signature);
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError> {
        for attempt in 1..=self.max_attempts {
            match self
                .client
                .get_signature_status_with_commitment(signature, commitment)
                .await?
            {
                Some(Ok(())) => {
                    debug!(
                        "Transaction {} reached {:?} commitment",
                        signature, commitment.commitment
                    );
                    return Ok(());
                }
                Some(Err(err)) => {
                    return Err(RpcError::TransactionFailed {
                        signature: *signature,
                        reason: err.to_string(),
                    });
                }
                None => {}
            }

            if attempt < self.max_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(RpcError::Timeout(*signature))
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.client.get_balance(pubkey).await?)
    }
}
