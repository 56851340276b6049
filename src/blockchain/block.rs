use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::crypto::block_digest;
use super::transaction::Transaction;

/// Largest value a freshly built block draws for its nonce
pub const MAX_INITIAL_NONCE: u64 = 999_999_999;

/// Represents a block in the blockchain
///
/// The hash is not stored: it is recomputed from the current fields by
/// [`Block::compute_hash`], so a nonce update can never leave it stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Hash of the previous block (empty for genesis)
    pub prev_hash: String,

    /// The transaction recorded by this block
    pub transaction: Transaction,

    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Random at construction, replaced by the proof of work solution
    pub nonce: u64,
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `prev_hash` - The hash of the previous block
    /// * `transaction` - The transaction to record
    pub fn new(prev_hash: String, transaction: Transaction) -> Self {
        Block::with_timestamp(prev_hash, transaction, Utc::now())
    }

    /// Creates a new block with an explicit timestamp
    pub fn with_timestamp(
        prev_hash: String,
        transaction: Transaction,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Block {
            prev_hash,
            transaction,
            timestamp,
            nonce: rand::thread_rng().gen_range(0..=MAX_INITIAL_NONCE),
        }
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block's current fields as a hexadecimal string
    pub fn compute_hash(&self) -> String {
        let block_data = serde_json::json!({
            "prev_hash": self.prev_hash,
            "transaction": self.transaction.canonical_encoding(),
            "timestamp": self.timestamp,
            "nonce": self.nonce,
        });

        block_digest(block_data.to_string().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Address;

    fn sample_block() -> Block {
        let transaction = Transaction::new(10.0, Address::from("alice"), Address::from("bob"));
        Block::new("previous_hash".to_string(), transaction)
    }

    #[test]
    fn test_new_block() {
        let block = sample_block();

        assert_eq!(block.prev_hash, "previous_hash");
        assert_eq!(block.transaction.amount(), 10.0);
        assert!(block.nonce <= MAX_INITIAL_NONCE);
    }

    #[test]
    fn test_compute_hash() {
        let block = sample_block();

        let hash = block.compute_hash();
        assert_eq!(hash.len(), 64); // SHA-256 hash is 64 characters in hex
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, block.compute_hash());
    }

    #[test]
    fn test_hash_follows_nonce() {
        let mut block = sample_block();
        let before = block.compute_hash();

        block.nonce = block.nonce.wrapping_add(1);
        assert_ne!(before, block.compute_hash());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let block = sample_block();
        let hash = block.compute_hash();

        let mut relinked = block.clone();
        relinked.prev_hash = "other".to_string();
        assert_ne!(hash, relinked.compute_hash());

        let mut restamped = block.clone();
        restamped.timestamp = block.timestamp + chrono::Duration::milliseconds(1);
        assert_ne!(hash, restamped.compute_hash());

        let mut rewritten = block.clone();
        rewritten.transaction = Transaction::new(11.0, Address::from("alice"), Address::from("bob"));
        assert_ne!(hash, rewritten.compute_hash());
    }

    #[test]
    fn test_identical_fields_hash_identically() {
        let block = sample_block();
        let mut twin = Block::with_timestamp(
            block.prev_hash.clone(),
            block.transaction.clone(),
            block.timestamp,
        );
        twin.nonce = block.nonce;

        assert_eq!(block.compute_hash(), twin.compute_hash());
    }
}
