//! Node-level orchestration: shared state, mining, conflict resolution.
//!
//! A `NodeContext` owns everything a request handler touches — the ledger,
//! the peer registry, the proof-of-work engine and the per-process node
//! identifier — and is passed by handle into every request path. Nothing
//! lives at process scope.

use crate::block::Block;
use crate::config::Config;
use crate::consensus::{resolve, HttpChainFetcher, ResolveOutcome};
use crate::error::{ChainError, Result};
use crate::ledger::Ledger;
use crate::peers::PeerRegistry;
use crate::pow::{CancelToken, ProofOfWork};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub struct NodeContext {
    /// Dash-free v4 identifier, generated once per process. Mining rewards
    /// are paid to it.
    pub node_id: String,
    pub pow: ProofOfWork,
    pub ledger: Arc<RwLock<Ledger>>,
    pub peers: Arc<RwLock<PeerRegistry>>,
    fetcher: HttpChainFetcher,
    active_search: Mutex<Option<CancelToken>>,
}

impl NodeContext {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(NodeContext {
            node_id: Uuid::new_v4().simple().to_string(),
            pow: ProofOfWork::new(config.pow.leading_zeros),
            ledger: Arc::new(RwLock::new(Ledger::new())),
            peers: Arc::new(RwLock::new(PeerRegistry::new())),
            fetcher: HttpChainFetcher::new(Duration::from_secs(
                config.consensus.peer_timeout_secs,
            ))?,
            active_search: Mutex::new(None),
        })
    }

    /// Mine one block: search for a proof on a blocking thread with no ledger
    /// lock held, then seal the pending pool plus the reward transaction
    /// under the write lock.
    ///
    /// If the chain moves while the search runs — a concurrent mine, or a
    /// consensus replacement that cancels the search — the search restarts
    /// from the new tip, so the sealed block always links to the proof it was
    /// mined against.
    pub async fn mine(&self) -> Result<Block> {
        loop {
            let last_proof = self.ledger.read().await.last_block().proof;

            let token = CancelToken::new();
            *self.active_search.lock().await = Some(token.clone());

            let pow = self.pow.clone();
            let search_token = token.clone();
            let found = tokio::task::spawn_blocking(move || {
                pow.search_cancellable(last_proof, &search_token)
            })
            .await
            .map_err(|e| ChainError::Internal(format!("mining task failed: {e}")))?;

            *self.active_search.lock().await = None;

            let Some(proof) = found else {
                debug!("proof search cancelled, restarting from the new tip");
                continue;
            };

            let mut ledger = self.ledger.write().await;
            if ledger.last_block().proof != last_proof {
                debug!("tip changed during search, restarting");
                continue;
            }

            ledger.push_reward(&self.node_id);
            let block = ledger.seal_block(proof, None);
            info!(index = block.index, proof = block.proof, "new block forged");
            return Ok(block);
        }
    }

    /// Poll every known peer and adopt the longest fully-valid chain if it is
    /// strictly longer than ours. Network round-trips happen with no ledger
    /// lock held; only the final swap takes the write lock.
    pub async fn resolve_conflicts(&self) -> ResolveOutcome {
        let current = self.ledger.read().await.chain().to_vec();
        let peers = self.peers.read().await.members();

        let outcome = resolve(&current, &peers, &self.fetcher, &self.pow).await;
        if !outcome.replaced {
            return outcome;
        }

        let mut ledger = self.ledger.write().await;
        // The chain may have grown while we were fetching; strictly-longer
        // still has to hold at swap time.
        if outcome.chain.len() as u64 <= ledger.len() {
            return ResolveOutcome {
                replaced: false,
                chain: ledger.chain().to_vec(),
            };
        }

        ledger.replace_chain(outcome.chain.clone());
        info!(length = ledger.len(), "chain replaced by longer peer chain");

        // A proof searched against the old tip is wasted work now.
        if let Some(token) = self.active_search.lock().await.take() {
            token.cancel();
        }

        outcome
    }
}
