use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use thiserror::Error;

use super::block::Block;
use super::crypto::{pow_digest, verify_signature, Address, CryptoError, DigitalSignature};
use super::transaction::Transaction;

/// Leading zero hex characters a proof of work digest needs by default
pub const DEFAULT_DIFFICULTY: u8 = 4;

/// Hex characters in a proof of work digest; more zeros can never match
pub const MAX_DIFFICULTY: u8 = 64;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Represents the blockchain
///
/// Cloning is cheap and every clone appends to the same sequence of blocks.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    blocks: Arc<Mutex<Vec<Block>>>,

    /// Mining difficulty (number of leading zeros required in the digest)
    difficulty: u8,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Creates a new blockchain holding only the genesis block
    pub fn new() -> Self {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    /// Creates a new blockchain that mines with `difficulty` leading zeros
    ///
    /// The value is clamped to `1..=MAX_DIFFICULTY`.
    pub fn with_difficulty(difficulty: u8) -> Self {
        let clamped = difficulty.clamp(1, MAX_DIFFICULTY);
        if clamped != difficulty {
            warn!("Difficulty {} out of range, using {}", difficulty, clamped);
        }

        Blockchain {
            blocks: Arc::new(Mutex::new(vec![genesis_block()])),
            difficulty: clamped,
        }
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Block>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gets the most recently appended block
    pub fn tail(&self) -> Block {
        let blocks = self.lock();
        last_block(&blocks).clone()
    }

    /// Gets a snapshot of the entire blockchain
    pub fn get_chain(&self) -> Vec<Block> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Always false: the genesis block is present from construction on
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Searches for the smallest `solution >= 1` whose digest of
    /// `"{seed}{solution}"` starts with the required zeros
    ///
    /// There is no iteration bound and no cancellation: this blocks the
    /// calling thread until a solution is found. At difficulty 4 that takes
    /// around 65 536 attempts on average.
    pub fn proof_of_work(&self, seed: u64) -> u64 {
        let target = "0".repeat(self.difficulty as usize);
        let mut solution = 1;

        info!("Mining with seed {} (difficulty {})", seed, self.difficulty);

        loop {
            let attempt = pow_digest(format!("{}{}", seed, solution).as_bytes());

            if attempt.starts_with(&target) {
                info!("Solved: {}", solution);
                return solution;
            }

            solution += 1;
        }
    }

    /// Appends a signed transaction as a new, mined block
    ///
    /// The signature must verify against the transaction's canonical
    /// encoding under `signer`. The chain is locked from verification to
    /// append, so concurrent callers are served one at a time and each new
    /// block links to the tail it was mined against. On any error the chain
    /// is left untouched; callers that do not care may drop the result.
    ///
    /// # Returns
    ///
    /// The appended block
    pub fn append_transaction(
        &self,
        transaction: Transaction,
        signer: &Address,
        signature: &DigitalSignature,
    ) -> Result<Block, BlockchainError> {
        let public_key = signer.to_public_key()?;
        let message = transaction.canonical_encoding();

        if !verify_signature(message.as_bytes(), signature, &public_key)? {
            warn!("Rejected transaction from {}: invalid signature", signer);
            return Err(BlockchainError::InvalidSignature);
        }

        let mut blocks = self.lock();

        let mut block = Block::new(last_block(&blocks).compute_hash(), transaction);
        block.nonce = self.proof_of_work(block.nonce);

        debug!("Block hash {} links to {}", block.compute_hash(), block.prev_hash);
        blocks.push(block.clone());
        info!("Appended block {} ({} blocks)", blocks.len() - 1, blocks.len());

        Ok(block)
    }

    /// Validates the blockchain
    ///
    /// # Returns
    ///
    /// true if the genesis block is intact and every link holds
    pub fn is_valid(&self) -> bool {
        let blocks = self.lock();
        validate_chain(&blocks)
    }
}

/// The fixed genesis block
///
/// Its timestamp and nonce are pinned so every chain starts from the same
/// block and hash.
pub fn genesis_block() -> Block {
    let mut block = Block::with_timestamp(
        String::new(),
        Transaction::genesis(),
        DateTime::<Utc>::UNIX_EPOCH,
    );
    block.nonce = 0;
    block
}

/// Checks the genesis block and every `prev_hash` link of `blocks`
pub fn validate_chain(blocks: &[Block]) -> bool {
    match blocks.first() {
        Some(first) if *first == genesis_block() => {}
        _ => return false,
    }

    blocks
        .windows(2)
        .all(|pair| pair[1].prev_hash == pair[0].compute_hash())
}

fn last_block(blocks: &[Block]) -> &Block {
    match blocks.last() {
        Some(block) => block,
        None => unreachable!("a blockchain always holds its genesis block"),
    }
}
