//! Transaction admission policy (§4.3): the checks a miner runs before it
//! agrees to mine a transaction it was asked to broadcast.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. the transaction id must not already appear on chain,
//! 2. the recipient must be a known wallet address at all,
//! 3. the recipient must currently be active (reachable via the tracker),
//! 4. replaying the chain from [`crate::constants::STARTING_WALLET_AMOUNT`]
//!    must leave the sender with at least `amount`.

use crate::block::GENESIS_PAYLOAD;
use crate::block::Block;
use crate::constants::STARTING_WALLET_AMOUNT;
use crate::error::AdmissionError;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionOutcome {
    /// The sender's balance after this transaction would be applied.
    pub remaining_balance: f64,
}

/// Run the four-step admission policy against `chain`. `all_wallets` and
/// `active_wallets` are the two lists a miner maintains from tracker
/// broadcasts (§6.3); `tx` is the candidate transaction.
pub fn verify_transaction(
    tx: &Transaction,
    all_wallets: &[String],
    active_wallets: &[String],
    chain: &[Block],
) -> Result<AdmissionOutcome, AdmissionError> {
    if transaction_exists(tx, chain) {
        return Err(AdmissionError::Duplicate);
    }
    if !all_wallets.iter().any(|w| w == &tx.recipient) {
        return Err(AdmissionError::UnknownRecipient(tx.recipient.clone()));
    }
    if !active_wallets.iter().any(|w| w == &tx.recipient) {
        return Err(AdmissionError::InactiveRecipient(tx.recipient.clone()));
    }
    let balance = replay_balance(&tx.sender, chain);
    if balance < tx.amount {
        return Err(AdmissionError::InsufficientFunds {
            sender: tx.sender.clone(),
            balance,
        });
    }
    Ok(AdmissionOutcome {
        remaining_balance: balance - tx.amount,
    })
}

fn transaction_exists(tx: &Transaction, chain: &[Block]) -> bool {
    chain_transactions(chain).any(|on_chain| on_chain.id == tx.id)
}

/// Every wallet starts with [`STARTING_WALLET_AMOUNT`]; each transaction on
/// chain debits its sender and credits its recipient. The genesis block
/// carries no transaction and is skipped.
fn replay_balance(wallet: &str, chain: &[Block]) -> f64 {
    let mut balance = STARTING_WALLET_AMOUNT;
    for tx in chain_transactions(chain) {
        if tx.sender == wallet {
            balance -= tx.amount;
        }
        if tx.recipient == wallet {
            balance += tx.amount;
        }
    }
    balance
}

fn chain_transactions(chain: &[Block]) -> impl Iterator<Item = Transaction> + '_ {
    chain
        .iter()
        .filter(|b| b.transaction != GENESIS_PAYLOAD)
        .filter_map(|b| Transaction::from_wire(&b.transaction).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    fn chain_with(transactions: &[Transaction]) -> Vec<Block> {
        let mut blocks = vec![Block::new(0, 0, GENESIS_PAYLOAD.to_string(), String::new())];
        for (i, tx) in transactions.iter().enumerate() {
            let prev_hash = blocks.last().unwrap().hash.clone();
            blocks.push(Block::new(
                (i + 1) as u64,
                0,
                tx.to_wire(),
                prev_hash,
            ));
        }
        blocks
    }

    #[test]
    fn rejects_duplicate_transaction() {
        let tx = Transaction::with_timestamp("alice", "bob", 10.0, 1.0);
        let chain = chain_with(&[tx.clone()]);
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = all.clone();
        assert_eq!(
            verify_transaction(&tx, &all, &active, &chain),
            Err(AdmissionError::Duplicate)
        );
    }

    #[test]
    fn rejects_unknown_recipient() {
        let tx = Transaction::with_timestamp("alice", "ghost", 10.0, 1.0);
        let chain = chain_with(&[]);
        let all = vec!["alice".to_string()];
        let active = all.clone();
        assert_eq!(
            verify_transaction(&tx, &all, &active, &chain),
            Err(AdmissionError::UnknownRecipient("ghost".to_string()))
        );
    }

    #[test]
    fn rejects_inactive_recipient() {
        let tx = Transaction::with_timestamp("alice", "bob", 10.0, 1.0);
        let chain = chain_with(&[]);
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = vec!["alice".to_string()];
        assert_eq!(
            verify_transaction(&tx, &all, &active, &chain),
            Err(AdmissionError::InactiveRecipient("bob".to_string()))
        );
    }

    #[test]
    fn rejects_insufficient_funds() {
        let tx = Transaction::with_timestamp("alice", "bob", STARTING_WALLET_AMOUNT + 1.0, 1.0);
        let chain = chain_with(&[]);
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = all.clone();
        assert_eq!(
            verify_transaction(&tx, &all, &active, &chain),
            Err(AdmissionError::InsufficientFunds {
                sender: "alice".to_string(),
                balance: STARTING_WALLET_AMOUNT,
            })
        );
    }

    #[test]
    fn accepts_well_formed_transaction_and_reports_remaining_balance() {
        let tx = Transaction::with_timestamp("alice", "bob", 30.0, 1.0);
        let chain = chain_with(&[]);
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = all.clone();
        let outcome = verify_transaction(&tx, &all, &active, &chain).unwrap();
        assert_eq!(outcome.remaining_balance, STARTING_WALLET_AMOUNT - 30.0);
    }

    #[test]
    fn balance_reflects_prior_chain_activity() {
        let earlier = Transaction::with_timestamp("alice", "bob", 40.0, 1.0);
        let chain = chain_with(&[earlier]);
        let tx = Transaction::with_timestamp("alice", "bob", STARTING_WALLET_AMOUNT - 40.0 + 1.0, 2.0);
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = all.clone();
        assert_eq!(
            verify_transaction(&tx, &all, &active, &chain),
            Err(AdmissionError::InsufficientFunds {
                sender: "alice".to_string(),
                balance: STARTING_WALLET_AMOUNT - 40.0,
            })
        );
    }
}
