// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::client::Notifier;
use crate::rpc::BlockchainRpc;
use crate::wallet::WalletProvider;
use log::*;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Connection state of the user's wallet.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    pubkey: Option<Pubkey>,
    balance: Option<f64>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            provider,
            pubkey: None,
            balance: None,
        }
    }

    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        self.pubkey
    }

    /// Last balance fetched with [`WalletSession::refresh_balance`], in SOL.
    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some() && self.pubkey.is_some()
    }

    /// Reconnects a previously trusted wallet without prompting. Failures are ignored.
    pub async fn try_reconnect(&mut self) -> bool {
        let Some(provider) = self.provider.as_ref() else {
            return false;
        };

        match provider.connect(true).await {
            Ok(pubkey) => {
                self.pubkey = Some(pubkey);
                true
            }
            Err(err) => {
                debug!("Silent wallet reconnect failed: {}", err);
                false
            }
        }
    }

    pub async fn connect(&mut self, notifier: &dyn Notifier) -> bool {
        let Some(provider) = self.provider.as_ref() else {
            notifier.error("Install a wallet provider");
            return false;
        };

        match provider.connect(false).await {
            Ok(pubkey) => {
                self.pubkey = Some(pubkey);
                notifier.success("Connected");
                true
            }
            Err(err) => {
                error!("Wallet connect failed: {}", err);
                notifier.error("Connect failed");
                false
            }
        }
    }

    pub async fn disconnect(&mut self, notifier: &dyn Notifier) {
        if let Some(provider) = self.provider.as_ref() {
            provider.disconnect().await;
        }

        self.pubkey = None;
        self.balance = None;
        notifier.info("Disconnected");
    }

    pub async fn refresh_balance(&mut self, rpc: &dyn BlockchainRpc) -> Option<f64> {
        let pubkey = self.pubkey.filter(|_| self.provider.is_some())?;

        match rpc.get_balance(&pubkey).await {
            Ok(lamports) => {
                let balance = lamports_to_sol(lamports);
                self.balance = Some(balance);
                Some(balance)
            }
            Err(err) => {
                error!("Error fetching balance: {}", err);
                None
            }
        }
    }
}
