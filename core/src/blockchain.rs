//! The chain itself: construction, validation, and reconciliation against a
//! competing chain received from a peer (§4.1, §4.2).

use crate::block::{Block, GENESIS_PAYLOAD};
use crate::error::ChainError;
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

/// What a caller of [`Blockchain::reconcile`] must do afterward (§4.2): the
/// reconciliation rule always ends in either adopting the peer's chain,
/// rebroadcasting ours because we won a tie the peer doesn't know about yet,
/// or doing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Adopted,
    RebroadcastLocal,
    NoAction,
}

impl Blockchain {
    /// Mine a fresh genesis block: index 0, empty `prev_hash`, transaction
    /// payload `"GENESIS"`, nonce drawn at random until the hash satisfies
    /// the difficulty target. Every independently-started miner produces a
    /// different genesis block (different nonce, different hash); chains
    /// with different geneses never reconcile, which is why a miner only
    /// mines its own genesis when the tracker reports it as the sole peer.
    pub fn new_with_genesis() -> Self {
        let genesis = mine_block(0, GENESIS_PAYLOAD.to_string(), String::new());
        Blockchain {
            blocks: vec![genesis],
        }
    }

    /// Wrap an externally supplied, already-validated sequence of blocks
    /// (e.g. one adopted from a peer during reconciliation). Deliberately
    /// bypasses genesis mining: the blocks already exist and were validated
    /// by [`Blockchain::is_valid_chain`] before this is called.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Blockchain { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always has a genesis block")
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// Mine and append the next block carrying `transaction_payload` (a
    /// `Transaction::to_wire()` string). Returns the mined block.
    pub fn mine_next(&mut self, transaction_payload: String) -> Block {
        let index = self.tip().index + 1;
        let prev_hash = self.tip().hash.clone();
        let block = mine_block(index, transaction_payload, prev_hash);
        self.blocks.push(block.clone());
        block
    }

    /// Append `block` iff it chains directly onto the current tip and is
    /// individually well-formed. Used when a freshly mined or received
    /// single block arrives out of band from a full chain replacement.
    pub fn try_add_block(&mut self, block: Block) -> bool {
        if block.index != self.tip().index + 1 {
            return false;
        }
        if block.prev_hash != self.tip().hash {
            return false;
        }
        if !block.is_valid_block() {
            return false;
        }
        self.blocks.push(block);
        true
    }

    /// A chain is valid iff every block is individually well-formed and
    /// each block's `prev_hash` matches its predecessor's `hash`, starting
    /// from a genesis block at index 0 with an empty `prev_hash`.
    pub fn is_valid_chain(blocks: &[Block]) -> bool {
        match blocks.first() {
            None => false,
            Some(genesis) => {
                if !genesis.is_genesis() || !genesis.is_valid_block() {
                    return false;
                }
                blocks.windows(2).all(|pair| {
                    let (prev, next) = (&pair[0], &pair[1]);
                    next.index == prev.index + 1
                        && next.prev_hash == prev.hash
                        && next.is_valid_block()
                })
            }
        }
    }

    /// Longest-chain reconciliation (§4.2): adopt `candidate` when it is
    /// strictly longer and valid, or when it ties in length and its tip
    /// hash is lexicographically smaller than ours (a deterministic
    /// tie-break every honest peer computes identically). Ties on an
    /// identical tip hash require no action — both sides already agree.
    /// A tie with distinct tips that we win still requires rebroadcasting
    /// our chain, since the peer that sent `candidate` needs to learn it
    /// lost the tie-break too.
    pub fn reconcile(&mut self, candidate: Vec<Block>) -> ReconcileOutcome {
        if !Blockchain::is_valid_chain(&candidate) {
            return ReconcileOutcome::NoAction;
        }
        match candidate.len().cmp(&self.blocks.len()) {
            std::cmp::Ordering::Greater => {
                self.blocks = candidate;
                ReconcileOutcome::Adopted
            }
            std::cmp::Ordering::Equal => {
                let candidate_tip = candidate.last().map(|b| b.hash.as_str());
                let our_tip = self.blocks.last().map(|b| b.hash.as_str());
                if candidate_tip == our_tip {
                    ReconcileOutcome::NoAction
                } else if candidate_tip < our_tip {
                    self.blocks = candidate;
                    ReconcileOutcome::Adopted
                } else {
                    ReconcileOutcome::RebroadcastLocal
                }
            }
            std::cmp::Ordering::Less => ReconcileOutcome::NoAction,
        }
    }

    /// §6.5: a JSON array of block-wire strings (each element itself a
    /// JSON-encoded string, doubly encoded, matching the wire format a
    /// received chain arrives in).
    pub fn to_wire(&self) -> String {
        let encoded: Vec<String> = self.blocks.iter().map(Block::to_wire).collect();
        serde_json::to_string(&encoded).expect("chain serializes infallibly")
    }

    pub fn from_wire(payload: &str) -> Result<Vec<Block>, ChainError> {
        let encoded: Vec<String> =
            serde_json::from_str(payload).map_err(|e| ChainError::BadChain(e.to_string()))?;
        encoded
            .iter()
            .map(|s| Block::from_wire(s))
            .collect::<Result<Vec<_>, _>>()
    }
}

/// Repeatedly sample random `u32` nonces until one produces a hash with the
/// required number of leading hex zeros. Mirrors the original miner's retry
/// loop, but samples the nonce space at random rather than scanning it
/// sequentially, per the protocol's mining rule.
fn mine_block(index: u64, transaction: String, prev_hash: String) -> Block {
    let mut rng = rand::thread_rng();
    loop {
        let nonce: u32 = rng.gen();
        let candidate = Block::new(index, nonce, transaction.clone(), prev_hash.clone());
        if candidate.is_valid_block() {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_chain_is_valid() {
        let chain = Blockchain::new_with_genesis();
        assert_eq!(chain.len(), 1);
        assert!(Blockchain::is_valid_chain(chain.blocks()));
    }

    #[test]
    fn mined_block_extends_the_chain() {
        let mut chain = Blockchain::new_with_genesis();
        let block = chain.mine_next("payload".to_string());
        assert_eq!(block.index, 1);
        assert_eq!(block.prev_hash, chain.genesis().hash);
        assert!(Blockchain::is_valid_chain(chain.blocks()));
    }

    #[test]
    fn try_add_block_rejects_wrong_predecessor() {
        let mut chain = Blockchain::new_with_genesis();
        let mut bogus = chain.tip().clone();
        bogus.index = 1;
        bogus.prev_hash = "not-the-real-tip".to_string();
        assert!(!chain.try_add_block(bogus));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn reconcile_prefers_longer_chain() {
        let mut ours = Blockchain::new_with_genesis();
        let mut theirs = ours.clone();
        theirs.mine_next("a".to_string());
        theirs.mine_next("b".to_string());

        assert_eq!(
            ours.reconcile(theirs.blocks().to_vec()),
            ReconcileOutcome::Adopted
        );
        assert_eq!(ours.len(), 3);
    }

    #[test]
    fn reconcile_rejects_shorter_chain() {
        let mut ours = Blockchain::new_with_genesis();
        ours.mine_next("a".to_string());
        ours.mine_next("b".to_string());
        let shorter = Blockchain::new_with_genesis();

        assert_eq!(
            ours.reconcile(shorter.blocks().to_vec()),
            ReconcileOutcome::NoAction
        );
        assert_eq!(ours.len(), 3);
    }

    #[test]
    fn reconcile_same_length_identical_tip_is_a_no_op() {
        let mut ours = Blockchain::new_with_genesis();
        ours.mine_next("a".to_string());
        let theirs = ours.clone();

        assert_eq!(
            ours.reconcile(theirs.blocks().to_vec()),
            ReconcileOutcome::NoAction
        );
    }

    #[test]
    fn reconcile_tie_break_prefers_lexicographically_smaller_tip() {
        let genesis = Blockchain::new_with_genesis();
        let mut a = genesis.clone();
        a.mine_next("a".to_string());
        let mut b = genesis.clone();
        b.mine_next("b".to_string());
        assert_ne!(a.tip().hash, b.tip().hash);

        let (mut winner, loser) = if a.tip().hash < b.tip().hash {
            (a, b)
        } else {
            (b, a)
        };
        let winner_tip = winner.tip().hash.clone();

        let outcome = winner.reconcile(loser.blocks().to_vec());
        assert_eq!(outcome, ReconcileOutcome::RebroadcastLocal);
        assert_eq!(winner.tip().hash, winner_tip);

        let mut loser = loser;
        let outcome = loser.reconcile(winner.blocks().to_vec());
        assert_eq!(outcome, ReconcileOutcome::Adopted);
        assert_eq!(loser.tip().hash, winner_tip);
    }

    #[test]
    fn reconcile_rejects_invalid_chain() {
        let mut ours = Blockchain::new_with_genesis();
        let mut tampered = ours.clone();
        tampered.mine_next("a".to_string());
        tampered.mine_next("b".to_string());
        let mut blocks = tampered.blocks().to_vec();
        blocks[1].hash = "0000bogus".to_string();

        assert_eq!(ours.reconcile(blocks), ReconcileOutcome::NoAction);
        assert_eq!(ours.len(), 1);
    }

    #[test]
    fn chain_wire_round_trip() {
        let mut chain = Blockchain::new_with_genesis();
        chain.mine_next("payload".to_string());
        let wire = chain.to_wire();
        let back = Blockchain::from_wire(&wire).unwrap();
        assert_eq!(back, chain.blocks().to_vec());
    }
}
