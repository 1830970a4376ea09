//! The node-local chain and its pending transaction pool.
//!
//! A `Ledger` is created once per node with the genesis block pre-seeded.
//! Transactions accumulate in the pending pool until a seal freezes them
//! into a new block; the pool is cleared exactly then. The chain only ever
//! grows by one block at a time, except for the wholesale replacement
//! performed by consensus resolution.

use crate::block::{Block, BlockHash, Transaction, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};

#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// A fresh ledger with the genesis block pre-seeded: index 1, the fixed
    /// sentinel proof, and a linkage sentinel that is not a real digest.
    pub fn new() -> Self {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.seal_block(GENESIS_PROOF, Some(GENESIS_PREVIOUS_HASH.to_string()));
        ledger
    }

    /// Queue a transaction for the next sealed block and return the index of
    /// the block that will eventually contain it. The index is a hint, not a
    /// commitment: the pool may keep growing before the next seal.
    pub fn submit_transaction(&mut self, tx: Transaction) -> u64 {
        self.pending.push(tx);
        self.last_block().index + 1
    }

    /// Put the mining reward at the front of the pool so it leads the sealed
    /// block, coinbase-style.
    pub fn push_reward(&mut self, recipient: &str) {
        self.pending.insert(0, Transaction::reward(recipient));
    }

    /// Freeze the pending pool into a new block and append it. The linkage
    /// hash defaults to the canonical digest of the current tip; the override
    /// exists solely to seed the genesis sentinel.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<BlockHash>) -> Block {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block().canonical_hash(),
        };
        let block = Block::new(
            self.chain.len() as u64 + 1,
            std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        );
        self.chain.push(block.clone());
        block
    }

    /// Swap the whole chain for a longer one adopted from a peer. Pending
    /// transactions are left in place; they were never sealed.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        debug_assert!(!chain.is_empty(), "a chain is never empty");
        self.chain = chain;
    }

    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain is never empty")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> u64 {
        self.chain.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }
}
