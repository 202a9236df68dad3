// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::wallet::{WalletError, WalletProvider};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// File backed wallet holding a single keypair.
pub struct KeypairWallet {
    keypair: Keypair,
    connected: AtomicBool,

    /// Whether `connect(true)` may succeed without a prior interactive connect.
    trusted: bool,
}

impl fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("pubkey", &self.pubkey())
            .field("secret_key", &"[REDACTED]")
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish()
    }
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(false),
            trusted: true,
        }
    }

    /// Marks the wallet as not trusted so silent reconnects fail.
    pub fn untrusted(mut self) -> Self {
        self.trusted = false;
        self
    }

    /// Loads a JSON array keypair file as written by the Solana CLI.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path).map_err(|err| WalletError::Keypair {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        Ok(Self::new(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        if only_if_trusted && !self.trusted {
            return Err(WalletError::Rejected("wallet is not trusted".to_owned()));
        }

        self.connected.store(true, Ordering::Release);
        Ok(self.pubkey())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }

        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[&self.keypair], blockhash)?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::write_keypair_file;
    use solana_sdk::system_instruction;
    use std::fs;

    fn transfer_from(from: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(from, &Pubkey::new_unique(), 10);
        let mut tx = Transaction::new_with_payer(&[ix], Some(from));
        tx.message.recent_blockhash = Hash::new_unique();
        tx
    }

    fn temp_keypair_path() -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("shibartum-keypair-{}.json", rand::random::<u64>()));
        path
    }

    #[tokio::test]
    async fn it_signs_only_when_connected() {
        let wallet = KeypairWallet::new(Keypair::new());
        let tx = transfer_from(&wallet.pubkey());

        assert!(matches!(
            wallet.sign_transaction(tx.clone()).await,
            Err(WalletError::NotConnected)
        ));

        assert_eq!(wallet.connect(false).await.unwrap(), wallet.pubkey());
        let signed = wallet.sign_transaction(tx).await.unwrap();
        assert!(signed.is_signed());
        assert!(signed.verify().is_ok());

        wallet.disconnect().await;
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    async fn it_refuses_transactions_it_does_not_pay() {
        let wallet = KeypairWallet::new(Keypair::new());
        wallet.connect(false).await.unwrap();

        let tx = transfer_from(&Pubkey::new_unique());
        assert!(matches!(
            wallet.sign_transaction(tx).await,
            Err(WalletError::Signer(_))
        ));
    }

    #[tokio::test]
    async fn untrusted_wallet_rejects_silent_connect() {
        let wallet = KeypairWallet::new(Keypair::new()).untrusted();
        assert!(wallet.connect(true).await.is_err());
        assert!(wallet.connect(false).await.is_ok());
    }

    #[test]
    fn it_loads_keypair_files() {
        let keypair = Keypair::new();
        let path = temp_keypair_path();
        write_keypair_file(&keypair, &path).unwrap();

        let wallet = KeypairWallet::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn it_rejects_bad_keypair_files() {
        let path = temp_keypair_path();
        fs::write(&path, serde_json::to_string(&[1u8; 32]).unwrap()).unwrap();
        let short = KeypairWallet::from_file(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(short, Err(WalletError::Keypair { .. })));

        let missing = KeypairWallet::from_file("/nonexistent/shibartum/id.json");
        assert!(matches!(missing, Err(WalletError::Keypair { .. })));
    }
}
