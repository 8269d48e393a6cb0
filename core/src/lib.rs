pub mod admission;
pub mod block;
pub mod blockchain;
pub mod constants;
pub mod directory;
pub mod error;
pub mod transaction;
pub mod wire;

pub use admission::{verify_transaction, AdmissionOutcome};
pub use block::Block;
pub use blockchain::{Blockchain, ReconcileOutcome};
pub use constants::{DIFFICULTY, STARTING_WALLET_AMOUNT};
pub use error::{AdmissionError, ChainError, WireError};
pub use transaction::Transaction;
