// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

mod keypair;
mod session;

pub use crate::wallet::keypair::*;
pub use crate::wallet::session::*;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("request rejected by the wallet: {0}")]
    Rejected(String),

    #[error("could not load keypair {path}: {reason}")]
    Keypair { path: String, reason: String },

    #[error(transparent)]
    Signer(#[from] SignerError),
}

/// A wallet able to hold a key and sign transactions on the user's behalf.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connects and returns the wallet's public key. With `only_if_trusted`
    /// the wallet must not prompt the user and fails instead.
    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self);

    /// Signs the slot of `transaction` belonging to this wallet.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;
}
