// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Test doubles for the external services used by the client.

use crate::api::types::{ConfirmPurchaseRequest, PurchaseConfirmation};
use crate::client::{BackendError, ConfirmationApi, Notifier};
use crate::rpc::{BlockchainRpc, RpcError};
use crate::wallet::{WalletError, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicUsize, Ordering};

fn node_error(message: &str) -> RpcError {
    RpcError::Client(ClientError::from(ClientErrorKind::Custom(message.to_owned())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcStep {
    Blockhash,
    Send,
    Confirm,
}

#[derive(Debug)]
pub struct FakeRpc {
    pub fail_at: Option<RpcStep>,
    pub balance: u64,
    pub blockhash: Hash,
    blockhash_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
    sent: Mutex<Vec<Transaction>>,
}

impl Default for FakeRpc {
    fn default() -> Self {
        Self {
            fail_at: None,
            balance: 2_500_000_000,
            blockhash: Hash::new_unique(),
            blockhash_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            sent: Mutex::new(vec![]),
        }
    }
}

impl FakeRpc {
    pub fn failing_at(step: RpcStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    pub fn blockhash_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    /// Transactions submitted so far.
    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl BlockchainRpc for FakeRpc {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_at == Some(RpcStep::Blockhash) {
            return Err(node_error("connection refused"));
        }

        Ok(self.blockhash)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.sent.lock().push(transaction.clone());

        if self.fail_at == Some(RpcStep::Send) {
            return Err(node_error("Transaction simulation failed"));
        }

        transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| node_error("unsigned transaction"))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<(), RpcError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_at == Some(RpcStep::Confirm) {
            return Err(RpcError::Timeout(*signature));
        }

        Ok(())
    }

    async fn get_balance(&self, _pubkey: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.balance)
    }
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub reject: Option<String>,
    requests: Mutex<Vec<ConfirmPurchaseRequest>>,
}

impl FakeBackend {
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject: Some(message.to_owned()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ConfirmPurchaseRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ConfirmationApi for FakeBackend {
    async fn confirm_purchase(
        &self,
        request: &ConfirmPurchaseRequest,
    ) -> Result<PurchaseConfirmation, BackendError> {
        self.requests.lock().push(request.clone());

        if let Some(message) = &self.reject {
            return Err(BackendError::Rejected(message.clone()));
        }

        Ok(PurchaseConfirmation {
            signature: request.signature.clone(),
            buyer: request.buyer.clone(),
            amount: request.amount,
            token_price: 0.000045,
            total_cost: request.amount * 0.000045,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    statuses: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn status(&self, message: &str) {
        self.statuses.lock().push(message.to_owned());
    }

    fn info(&self, message: &str) {
        self.infos.lock().push(message.to_owned());
    }

    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_owned());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_owned());
    }
}

/// Wallet whose user declines every signature request. Connecting succeeds
/// only when a key is set.
#[derive(Debug, Default)]
pub struct RejectingWallet {
    pub pubkey: Option<Pubkey>,
}

#[async_trait]
impl WalletProvider for RejectingWallet {
    async fn connect(&self, _only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        self.pubkey
            .ok_or_else(|| WalletError::Rejected("User rejected the request".to_owned()))
    }

    async fn disconnect(&self) {}

    async fn sign_transaction(&self, _transaction: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::Rejected("User rejected the request".to_owned()))
    }
}
