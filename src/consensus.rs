//! Longest-valid-chain conflict resolution across peers.
//!
//! Each known peer is polled for its full chain; a candidate becomes the new
//! chain only when it is strictly longer than everything seen so far,
//! including our own chain, and passes full validation. Unreachable peers and
//! invalid candidates are skipped the same way: resolution always returns a
//! definite result.

use crate::block::Block;
use crate::error::{ChainError, Result};
use crate::pow::ProofOfWork;
use crate::validation::is_valid_chain;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A peer's view of its chain, as reported by its query interface.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChain {
    pub chain: Vec<Block>,
    pub length: u64,
}

/// How candidate chains are obtained from peers. The resolver only needs this
/// one capability, so tests can swap in canned fetchers.
#[async_trait]
pub trait ChainFetcher: Send + Sync {
    async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain>;
}

/// Fetches peer chains over their HTTP query interface.
pub struct HttpChainFetcher {
    client: reqwest::Client,
}

impl HttpChainFetcher {
    /// The timeout bounds each peer round-trip; an unresponsive peer becomes
    /// a skip, never a stall of the whole resolution.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::NetworkError(format!("http client: {e}")))?;
        Ok(HttpChainFetcher { client })
    }
}

#[async_trait]
impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain> {
        let url = format!("http://{peer}/chain");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::PeerError(format!("{peer}: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::PeerError(format!(
                "{peer}: status {}",
                response.status()
            )));
        }

        response
            .json::<RemoteChain>()
            .await
            .map_err(|e| ChainError::PeerError(format!("{peer}: invalid chain payload: {e}")))
    }
}

/// Result of one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/// Poll `peers` and pick the longest valid chain that is strictly longer than
/// `current`. Equal-length candidates never win; flapping between same-length
/// forks would churn state for no benefit.
pub async fn resolve<F: ChainFetcher>(
    current: &[Block],
    peers: &[String],
    fetcher: &F,
    pow: &ProofOfWork,
) -> ResolveOutcome {
    let mut best: Option<Vec<Block>> = None;
    let mut max_length = current.len() as u64;

    for peer in peers {
        let remote = match fetcher.fetch_chain(peer).await {
            Ok(remote) => remote,
            Err(e) => {
                debug!(peer = %peer, error = %e, "peer skipped");
                continue;
            }
        };

        if remote.length <= max_length {
            continue;
        }
        if !is_valid_chain(&remote.chain, pow) {
            debug!(peer = %peer, length = remote.length, "peer chain failed validation");
            continue;
        }

        max_length = remote.length;
        best = Some(remote.chain);
    }

    match best {
        Some(chain) => ResolveOutcome {
            replaced: true,
            chain,
        },
        None => ResolveOutcome {
            replaced: false,
            chain: current.to_vec(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Transaction;
    use crate::ledger::Ledger;
    use std::collections::HashMap;

    struct MockFetcher {
        chains: HashMap<String, RemoteChain>,
    }

    impl MockFetcher {
        fn new() -> Self {
            MockFetcher {
                chains: HashMap::new(),
            }
        }

        fn with_chain(mut self, peer: &str, chain: Vec<Block>) -> Self {
            let length = chain.len() as u64;
            self.chains
                .insert(peer.to_string(), RemoteChain { chain, length });
            self
        }
    }

    #[async_trait]
    impl ChainFetcher for MockFetcher {
        async fn fetch_chain(&self, peer: &str) -> Result<RemoteChain> {
            self.chains
                .get(peer)
                .cloned()
                .ok_or_else(|| ChainError::PeerError(format!("{peer}: connection refused")))
        }
    }

    fn mined_chain(length: usize, pow: &ProofOfWork) -> Vec<Block> {
        let mut ledger = Ledger::new();
        for i in 1..length {
            ledger.submit_transaction(Transaction::new(
                format!("sender-{i}"),
                "recipient".to_string(),
                1.0,
            ));
            let proof = pow.search(ledger.last_block().proof);
            ledger.seal_block(proof, None);
        }
        ledger.chain().to_vec()
    }

    #[tokio::test]
    async fn adopts_strictly_longer_valid_chain() {
        let pow = ProofOfWork::default();
        let current = Ledger::new().chain().to_vec();
        let longer = mined_chain(3, &pow);

        let fetcher = MockFetcher::new().with_chain("peer-a:5000", longer.clone());
        let outcome = resolve(&current, &["peer-a:5000".to_string()], &fetcher, &pow).await;

        assert!(outcome.replaced);
        assert_eq!(outcome.chain, longer);
    }

    #[tokio::test]
    async fn equal_length_never_replaces() {
        let pow = ProofOfWork::default();
        let current = mined_chain(3, &pow);
        let rival = mined_chain(3, &pow);

        let fetcher = MockFetcher::new().with_chain("peer-a:5000", rival);
        let outcome = resolve(&current, &["peer-a:5000".to_string()], &fetcher, &pow).await;

        assert!(!outcome.replaced);
        assert_eq!(outcome.chain, current);
    }

    #[tokio::test]
    async fn longer_but_invalid_chain_is_discarded() {
        let pow = ProofOfWork::default();
        let current = Ledger::new().chain().to_vec();
        let mut forged = mined_chain(3, &pow);
        forged[2].previous_hash = "0000000000000000".to_string();

        let fetcher = MockFetcher::new().with_chain("peer-a:5000", forged);
        let outcome = resolve(&current, &["peer-a:5000".to_string()], &fetcher, &pow).await;

        assert!(!outcome.replaced);
        assert_eq!(outcome.chain.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_peers_are_skipped() {
        let pow = ProofOfWork::default();
        let current = Ledger::new().chain().to_vec();
        let longer = mined_chain(2, &pow);

        let fetcher = MockFetcher::new().with_chain("up:5000", longer.clone());
        let peers = vec!["down:5000".to_string(), "up:5000".to_string()];
        let outcome = resolve(&current, &peers, &fetcher, &pow).await;

        assert!(outcome.replaced);
        assert_eq!(outcome.chain, longer);
    }

    #[tokio::test]
    async fn longest_of_several_valid_chains_wins() {
        let pow = ProofOfWork::default();
        let current = Ledger::new().chain().to_vec();
        let three = mined_chain(3, &pow);
        let five = mined_chain(5, &pow);

        let fetcher = MockFetcher::new()
            .with_chain("peer-a:5000", three)
            .with_chain("peer-b:5000", five.clone());
        let peers = vec!["peer-a:5000".to_string(), "peer-b:5000".to_string()];
        let outcome = resolve(&current, &peers, &fetcher, &pow).await;

        assert!(outcome.replaced);
        assert_eq!(outcome.chain, five);
    }

    #[tokio::test]
    async fn no_peers_means_no_change() {
        let pow = ProofOfWork::default();
        let current = Ledger::new().chain().to_vec();

        let outcome = resolve(&current, &[], &MockFetcher::new(), &pow).await;
        assert!(!outcome.replaced);
        assert_eq!(outcome.chain, current);
    }
}
