//! A monetary transfer between two wallet identifiers (§3 Transaction).
//!
//! `id` is a pure function of the other four fields: the hex SHA-256 digest of
//! their canonical string forms concatenated in declaration order. Two
//! transactions built from identical (sender, recipient, amount, timestamp)
//! always carry identical ids.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub timestamp: f64,
    pub id: String,
}

impl Transaction {
    /// Build a new transaction stamped with the current wall-clock time.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        let timestamp = unix_timestamp_now();
        Self::with_timestamp(sender, recipient, amount, timestamp)
    }

    /// Build a transaction with an explicit timestamp, useful for tests and
    /// for reconstructing a transaction with a known id.
    pub fn with_timestamp(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        timestamp: f64,
    ) -> Self {
        let sender = sender.into();
        let recipient = recipient.into();
        let id = compute_id(&sender, &recipient, amount, timestamp);
        Transaction {
            sender,
            recipient,
            amount,
            timestamp,
            id,
        }
    }

    /// Canonical wire encoding (§6.4): a JSON object with keys
    /// `sender, recipient, amount, timestamp, id`.
    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("Transaction serializes infallibly")
    }

    pub fn from_wire(payload: &str) -> Result<Self, ChainError> {
        serde_json::from_str(payload).map_err(|e| ChainError::BadTransaction(e.to_string()))
    }
}

fn compute_id(sender: &str, recipient: &str, amount: f64, timestamp: f64) -> String {
    let concatenated = format!("{sender}{recipient}{amount}{timestamp}");
    let digest = Sha256::digest(concatenated.as_bytes());
    hex::encode(digest)
}

fn unix_timestamp_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}
