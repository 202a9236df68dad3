// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

mod http;

pub use crate::rpc::http::*;

use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error("transaction {0} was not confirmed in time")]
    Timeout(Signature),
}

/// Parses `processed`, `confirmed` or `finalized`.
pub fn parse_commitment(s: &str) -> Result<CommitmentConfig, String> {
    CommitmentLevel::from_str(s)
        .map(|commitment| CommitmentConfig { commitment })
        .map_err(|_| format!("invalid commitment: {s}"))
}

/// Blockchain node operations used by the purchase flow.
#[async_trait]
pub trait BlockchainRpc: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Submits a signed transaction and returns its signature.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError>;

    /// Waits until `signature` reaches `commitment`.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError>;

    /// Balance in lamports.
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_commitments() {
        assert_eq!(
            parse_commitment("finalized").unwrap(),
            CommitmentConfig::finalized()
        );
        assert_eq!(
            parse_commitment("confirmed").unwrap(),
            CommitmentConfig::confirmed()
        );
        assert!(parse_commitment("max").is_err());
    }
}
