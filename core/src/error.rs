//! Typed errors for the protocol core. I/O and framing failures surface through
//! [`WireError`]; chain/transaction parsing failures through [`ChainError`].
//! Application binaries wrap these in `anyhow::Result` at the connection-handling
//! layer, matching the teacher's split between typed library errors and `anyhow`
//! at the edges.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown message type code {0}")]
    UnknownType(u8),
    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("malformed transaction payload: {0}")]
    BadTransaction(String),
    #[error("malformed block payload: {0}")]
    BadBlock(String),
    #[error("malformed chain payload: {0}")]
    BadChain(String),
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum AdmissionError {
    #[error("transaction already on chain")]
    Duplicate,
    #[error("{0} is not a valid wallet address")]
    UnknownRecipient(String),
    #[error("{0} is not currently active")]
    InactiveRecipient(String),
    #[error("{sender} only has {balance} in their account")]
    InsufficientFunds { sender: String, balance: f64 },
}
