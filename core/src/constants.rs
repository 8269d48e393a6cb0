//! Protocol-wide constants shared by every role.

/// Number of leading hex-zero characters a block hash must have to be valid PoW.
pub const DIFFICULTY: usize = 4;

/// Balance every wallet is assumed to start with when replaying the chain.
pub const STARTING_WALLET_AMOUNT: f64 = 100.0;
