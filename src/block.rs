//! Block and transaction model plus the canonical block digest.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a block's canonical encoding.
pub type BlockHash = String;

/// Proof carried by the genesis block instead of a mined nonce.
pub const GENESIS_PROOF: u64 = 100;

/// Linkage sentinel for the genesis block. Deliberately not a real digest;
/// validation never re-derives it.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Sender identifier marking a mining reward.
pub const REWARD_SENDER: &str = "0";

/// Fixed reward paid to the sealing node per block.
pub const BLOCK_REWARD: f64 = 1.0;

/// A transfer of value between two identifiers. Immutable once created;
/// amounts are accepted as-is, non-positive values included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: String, recipient: String, amount: f64) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
        }
    }

    /// The reward paid to the node that seals a block.
    pub fn reward(recipient: &str) -> Self {
        Transaction {
            sender: REWARD_SENDER.to_string(),
            recipient: recipient.to_string(),
            amount: BLOCK_REWARD,
        }
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

/// A sealed unit of the chain. Immutable once appended; the whole chain may
/// be swapped during consensus resolution, individual blocks never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: BlockHash,
}

impl Block {
    /// Stamp a new block at the current instant. The timestamp is an integer
    /// millisecond epoch so the canonical digest never depends on a
    /// floating-point rendering.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: BlockHash,
    ) -> Self {
        Block {
            index,
            timestamp: Utc::now().timestamp_millis(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// SHA-256 digest over the block's canonical JSON encoding. The field
    /// order is fixed by the struct declaration, so equal field values always
    /// produce the same digest, across calls and across processes.
    pub fn canonical_hash(&self) -> BlockHash {
        let encoded = serde_json::to_vec(self).expect("block encoding is infallible");
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hex::encode(hasher.finalize())
    }
}
