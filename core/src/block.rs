//! A single node in the chain (§3 Block, §4.1 PoW).
//!
//! `hash` is the SHA-256 hex digest of the canonical JSON object
//! `{index, nonce, prev_hash, transaction}` with keys in ascending order. A
//! block is well-formed iff `hash` is that digest AND begins with
//! [`crate::constants::DIFFICULTY`] hex zeros.

use crate::constants::DIFFICULTY;
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub const GENESIS_PAYLOAD: &str = "GENESIS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub nonce: u32,
    /// Either the literal `"GENESIS"` or a `Transaction::to_wire()` string.
    pub transaction: String,
    pub prev_hash: String,
    pub hash: String,
}

impl Block {
    /// Construct a block with a freshly computed hash for the given `nonce`.
    /// Does not check PoW validity — callers searching for a valid nonce call
    /// this repeatedly via [`crate::block::Block::with_nonce`].
    pub fn new(index: u64, nonce: u32, transaction: String, prev_hash: String) -> Self {
        let hash = calculate_hash(index, nonce, &transaction, &prev_hash);
        Block {
            index,
            nonce,
            transaction,
            prev_hash,
            hash,
        }
    }

    /// Recompute the hash for a new candidate `nonce`, leaving other fields
    /// untouched. Used by the mining search loop.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        Block::new(
            self.index,
            nonce,
            self.transaction.clone(),
            self.prev_hash.clone(),
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.transaction == GENESIS_PAYLOAD && self.prev_hash.is_empty()
    }

    /// True iff `hash` matches the recomputed digest and satisfies the PoW
    /// difficulty requirement.
    pub fn is_valid_block(&self) -> bool {
        self.hash == self.recalculate_hash() && has_required_zeros(&self.hash)
    }

    pub fn recalculate_hash(&self) -> String {
        calculate_hash(self.index, self.nonce, &self.transaction, &self.prev_hash)
    }

    pub fn to_wire(&self) -> String {
        serde_json::to_string(self).expect("Block serializes infallibly")
    }

    pub fn from_wire(payload: &str) -> Result<Self, ChainError> {
        serde_json::from_str(payload).map_err(|e| ChainError::BadBlock(e.to_string()))
    }
}

fn has_required_zeros(hash: &str) -> bool {
    hash.len() >= DIFFICULTY && hash.as_bytes()[..DIFFICULTY].iter().all(|&b| b == b'0')
}

/// The canonical hash input is a JSON object with keys sorted ascending
/// (`index`, `nonce`, `prev_hash`, `transaction`). `serde_json::Map` is a
/// `BTreeMap` by default (no `preserve_order` feature), so ascending order
/// falls out of the map rather than depending on insertion or struct
/// declaration order.
pub fn calculate_hash(index: u64, nonce: u32, transaction: &str, prev_hash: &str) -> String {
    let mut object = Map::new();
    object.insert("index".to_string(), Value::from(index));
    object.insert("nonce".to_string(), Value::from(nonce));
    object.insert("prev_hash".to_string(), Value::from(prev_hash));
    object.insert("transaction".to_string(), Value::from(transaction));
    let encoded = serde_json::to_string(&Value::Object(object)).expect("canonical json");
    hex::encode(Sha256::digest(encoded.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_pure_function_of_four_fields() {
        let a = calculate_hash(1, 42, "GENESIS", "");
        let b = calculate_hash(1, 42, "GENESIS", "");
        assert_eq!(a, b);
    }

    #[test]
    fn changing_any_field_changes_the_hash() {
        let base = calculate_hash(1, 42, "GENESIS", "abc");
        assert_ne!(base, calculate_hash(2, 42, "GENESIS", "abc"));
        assert_ne!(base, calculate_hash(1, 43, "GENESIS", "abc"));
        assert_ne!(base, calculate_hash(1, 42, "OTHER", "abc"));
        assert_ne!(base, calculate_hash(1, 42, "GENESIS", "xyz"));
    }

    #[test]
    fn tampered_hash_is_not_well_formed() {
        let mut block = Block::new(0, 0, GENESIS_PAYLOAD.to_string(), String::new());
        block.hash = "0000deadbeef".to_string();
        assert!(!block.is_valid_block());
    }

    #[test]
    fn wire_round_trip() {
        let block = Block::new(3, 7, "GENESIS".to_string(), "ab12".to_string());
        let wire = block.to_wire();
        let back = Block::from_wire(&wire).unwrap();
        assert_eq!(block, back);
    }
}
