// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use log::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("history file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        };
        f.pad(s)
    }
}

/// Outcome of one purchase attempt as kept in the local history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Payment signature. Absent when the attempt failed before submission.
    #[serde(default)]
    pub signature: Option<String>,

    pub buyer: String,

    /// Tokens bought.
    pub amount: u64,

    /// Milliseconds since the unix epoch.
    pub timestamp: i64,

    pub status: TransactionStatus,

    /// Price paid in SOL.
    pub total_cost: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Local, unauthoritative purchase history. Newest records come first.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<TransactionRecord>, HistoryError>;

    fn append(&self, record: TransactionRecord) -> Result<(), HistoryError>;

    fn clear(&self) -> Result<(), HistoryError>;
}

/// History kept as a JSON array in a file.
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<TransactionRecord>, HistoryError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    /// Moves an unreadable history file out of the way so new records can
    /// still be written.
    fn quarantine(&self) -> Result<PathBuf, HistoryError> {
        let aside = self.path.with_extension("json.corrupt");
        fs::rename(&self.path, &aside)?;
        Ok(aside)
    }

    fn write(&self, records: &[TransactionRecord]) -> Result<(), HistoryError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        // Write then rename so a crash never leaves a truncated file behind
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl HistoryStore for FileHistory {
    fn load(&self) -> Result<Vec<TransactionRecord>, HistoryError> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn append(&self, record: TransactionRecord) -> Result<(), HistoryError> {
        let _guard = self.lock.lock();
        let mut records = match self.read() {
            Err(HistoryError::Corrupt(err)) => {
                let aside = self.quarantine()?;
                warn!(
                    "History file {} is corrupt ({}), moved to {} and started a new one",
                    self.path.display(),
                    err,
                    aside.display()
                );
                vec![]
            }
            other => other?,
        };
        records.insert(0, record);
        self.write(&records)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<TransactionRecord>>,
}

impl HistoryStore for MemoryHistory {
    fn load(&self) -> Result<Vec<TransactionRecord>, HistoryError> {
        Ok(self.records.lock().clone())
    }

    fn append(&self, record: TransactionRecord) -> Result<(), HistoryError> {
        self.records.lock().insert(0, record);
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.records.lock().clear();
        Ok(())
    }
}

/// Block explorer page of a transaction.
pub fn explorer_url(signature: &str, network_name: &str) -> String {
    match network_name {
        "mainnet" => format!("https://explorer.solana.com/tx/{signature}"),
        cluster => format!("https://explorer.solana.com/tx/{signature}?cluster={cluster}"),
    }
}
