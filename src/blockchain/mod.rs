// Blockchain module
//
// This module contains the core ledger implementation including:
// - Transaction structure
// - Block structure and hashing
// - Blockchain structure with proof of work
// - Cryptography utilities
// - Wallets

pub mod block;
pub mod chain;
pub mod crypto;
pub mod transaction;
pub mod wallet;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError};
pub use crypto::{Address, DigitalSignature};
pub use transaction::Transaction;
pub use wallet::Wallet;
