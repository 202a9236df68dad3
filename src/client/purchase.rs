// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::api::types::{ConfirmPurchaseRequest, PurchaseConfirmation};
use crate::client::{
    explorer_url, BackendError, ConfirmationApi, HistoryStore, Notifier, TransactionRecord,
    TransactionStatus,
};
use crate::pricing::total_cost;
use crate::rpc::{parse_commitment, BlockchainRpc, RpcError};
use crate::settings::Settings;
use crate::wallet::{WalletError, WalletProvider, WalletSession};
use log::*;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::sol_to_lamports;
use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub const MIN_PURCHASE_AMOUNT: u64 = 1;

/// Parses a token amount typed by the user. Leading digits are taken,
/// anything unparsable counts as zero and the result is never below
/// [`MIN_PURCHASE_AMOUNT`].
pub fn clamp_amount(input: &str) -> u64 {
    let input = input.trim_start();
    let (negative, digits) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let parsed = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, d| {
            acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
        });

    if negative {
        MIN_PURCHASE_AMOUNT
    } else {
        parsed.max(MIN_PURCHASE_AMOUNT)
    }
}

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Please connect your wallet first")]
    WalletNotConnected,

    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("invalid owner public key: {0}")]
    InvalidOwnerKey(ParsePubkeyError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Presale parameters the purchase flow depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseConfig {
    pub owner_public_key: String,
    pub token_price_sol: f64,
    pub token_symbol: String,
    pub network_name: String,
    pub commitment: CommitmentConfig,
}

impl PurchaseConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let commitment = parse_commitment(&settings.client.commitment).unwrap_or_else(|err| {
            warn!("{}, using confirmed", err);
            CommitmentConfig::confirmed()
        });

        Self {
            owner_public_key: settings.presale.owner_public_key.clone(),
            token_price_sol: settings.presale.token_price_sol,
            token_symbol: settings.presale.token_symbol.clone(),
            network_name: settings.presale.network_name.clone(),
            commitment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub signature: Signature,
    pub confirmation: PurchaseConfirmation,
    pub explorer_url: String,
}

/// Drives one purchase from the connected wallet to the presale owner.
pub struct PurchaseFlow<'a> {
    session: &'a WalletSession,
    rpc: &'a dyn BlockchainRpc,
    backend: &'a dyn ConfirmationApi,
    history: &'a dyn HistoryStore,
    notifier: &'a dyn Notifier,
    config: PurchaseConfig,
}

impl<'a> PurchaseFlow<'a> {
    pub fn new(
        session: &'a WalletSession,
        rpc: &'a dyn BlockchainRpc,
        backend: &'a dyn ConfirmationApi,
        history: &'a dyn HistoryStore,
        notifier: &'a dyn Notifier,
        config: PurchaseConfig,
    ) -> Self {
        Self {
            session,
            rpc,
            backend,
            history,
            notifier,
            config,
        }
    }

    /// Buys `amount` tokens. Every failure past the precondition checks is
    /// recorded in the history as a failed attempt. Nothing is retried.
    pub async fn purchase(&self, amount: u64) -> Result<PurchaseReceipt, PurchaseError> {
        let (Some(provider), Some(buyer)) = (self.session.provider(), self.session.pubkey()) else {
            self.notifier.error(&PurchaseError::WalletNotConnected.to_string());
            return Err(PurchaseError::WalletNotConnected);
        };

        if amount < MIN_PURCHASE_AMOUNT {
            self.notifier.error(&PurchaseError::InvalidAmount.to_string());
            return Err(PurchaseError::InvalidAmount);
        }

        let cost = total_cost(amount as f64, self.config.token_price_sol);
        let mut signature = None;

        self.notifier.status("Preparing transaction...");
        let result = self
            .execute(provider, &buyer, amount, cost, &mut signature)
            .await;

        match result {
            Ok((signature, confirmation)) => {
                self.record(TransactionRecord {
                    signature: Some(signature.to_string()),
                    buyer: buyer.to_string(),
                    amount,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    status: TransactionStatus::Success,
                    total_cost: cost,
                    error: None,
                });

                let signature_str = signature.to_string();
                info!("Purchase of {} tokens confirmed: {}", amount, signature_str);
                self.notifier.success(&format!(
                    "Successfully purchased {} {} tokens!",
                    amount, self.config.token_symbol
                ));
                self.notifier.status(&format!(
                    "Purchase completed! Transaction: {}...",
                    &signature_str[..signature_str.len().min(8)]
                ));

                Ok(PurchaseReceipt {
                    signature,
                    confirmation,
                    explorer_url: explorer_url(&signature_str, &self.config.network_name),
                })
            }

            Err(err) => {
                error!("Purchase of {} tokens failed: {}", amount, err);
                self.record(TransactionRecord {
                    signature: signature.map(|s| s.to_string()),
                    buyer: buyer.to_string(),
                    amount,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    status: TransactionStatus::Failed,
                    total_cost: cost,
                    error: Some(err.to_string()),
                });

                self.notifier.error(&format!("Purchase failed: {err}"));
                self.notifier.status("Purchase failed. Please try again.");
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        provider: &Arc<dyn WalletProvider>,
        buyer: &Pubkey,
        amount: u64,
        cost: f64,
        submitted: &mut Option<Signature>,
    ) -> Result<(Signature, PurchaseConfirmation), PurchaseError> {
        let owner =
            Pubkey::from_str(&self.config.owner_public_key).map_err(PurchaseError::InvalidOwnerKey)?;

        self.notifier.status("Creating transaction...");
        let transfer = system_instruction::transfer(buyer, &owner, sol_to_lamports(cost));
        let mut transaction = Transaction::new_with_payer(&[transfer], Some(buyer));
        transaction.message.recent_blockhash = self.rpc.get_latest_blockhash().await?;

        self.notifier.status("Waiting for wallet approval...");
        let signed = provider.sign_transaction(transaction).await?;

        self.notifier.status("Sending transaction...");
        let signature = self.rpc.send_transaction(&signed).await?;
        *submitted = Some(signature);
        debug!("Submitted purchase transaction {}", signature);

        self.notifier.status("Confirming transaction...");
        self.rpc
            .confirm_transaction(&signature, self.config.commitment)
            .await?;

        self.notifier.status("Confirming purchase with backend...");
        let confirmation = self
            .backend
            .confirm_purchase(&ConfirmPurchaseRequest {
                signature: signature.to_string(),
                buyer: buyer.to_string(),
                amount: amount as f64,
            })
            .await?;

        Ok((signature, confirmation))
    }

    fn record(&self, record: TransactionRecord) {
        if let Err(err) = self.history.append(record) {
            warn!("Could not save transaction history: {}", err);
        }
    }
}
