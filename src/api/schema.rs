use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{Block, Transaction};

/// A block as served by the API, with its hash computed at read time
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockView {
    /// Hash of this block's current fields
    pub hash: String,

    /// Hash of the previous block (empty for genesis)
    pub prev_hash: String,

    /// The recorded transaction
    pub transaction: Transaction,

    /// Creation time in ISO 8601 format
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Proof of work solution
    pub nonce: u64,
}

impl From<Block> for BlockView {
    fn from(block: Block) -> Self {
        BlockView {
            hash: block.compute_hash(),
            prev_hash: block.prev_hash,
            transaction: block.transaction,
            timestamp: block.timestamp,
            nonce: block.nonce,
        }
    }
}
