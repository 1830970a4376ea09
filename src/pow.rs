//! Brute-force proof-of-work search and verification.
//!
//! A proof is valid when the SHA-256 digest of the previous proof's decimal
//! text concatenated with the candidate's (no separator) starts with a run of
//! `'0'` hex characters. The search tries candidates from zero upward and
//! returns the first that qualifies.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default difficulty: four leading zero hex characters, roughly 16^4
/// candidates per block.
pub const DEFAULT_LEADING_ZEROS: usize = 4;

/// How many candidates to try between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Shared flag for stopping an in-flight search, e.g. when a longer peer
/// chain arrives and the proof under construction is already stale.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The difficulty predicate, fixed for a node's lifetime.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    leading_zeros: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_LEADING_ZEROS)
    }
}

impl ProofOfWork {
    /// `leading_zeros` counts hex characters of the digest, capped at the
    /// digest's own length (64).
    pub fn new(leading_zeros: usize) -> Self {
        ProofOfWork {
            leading_zeros: leading_zeros.min(64),
        }
    }

    pub fn leading_zeros(&self) -> usize {
        self.leading_zeros
    }

    /// Whether `proof` is a valid successor to `last_proof`.
    pub fn validate(&self, last_proof: u64, proof: u64) -> bool {
        self.meets_target(&guess_digest(last_proof, proof))
    }

    /// Find the first valid proof in ascending order. Blocking and unbounded;
    /// deterministic for a given `last_proof`.
    pub fn search(&self, last_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !self.validate(last_proof, proof) {
            proof += 1;
        }
        proof
    }

    /// Same search, but gives up once `cancel` fires. Returns `None` only on
    /// cancellation.
    pub fn search_cancellable(&self, last_proof: u64, cancel: &CancelToken) -> Option<u64> {
        let mut proof = 0u64;
        loop {
            if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return None;
            }
            if self.validate(last_proof, proof) {
                return Some(proof);
            }
            proof += 1;
        }
    }

    /// One hex character per nibble: a run of `leading_zeros` zero characters
    /// means the leading whole bytes are zero, plus a high nibble when the
    /// run is odd.
    fn meets_target(&self, digest: &[u8; 32]) -> bool {
        let whole_bytes = self.leading_zeros / 2;
        if digest[..whole_bytes].iter().any(|byte| *byte != 0) {
            return false;
        }
        if self.leading_zeros % 2 == 1 {
            return digest[whole_bytes] < 0x10;
        }
        true
    }
}

fn guess_digest(last_proof: u64, proof: u64) -> [u8; 32] {
    let guess = format!("{last_proof}{proof}");
    Sha256::digest(guess.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_finds_a_valid_proof() {
        let pow = ProofOfWork::default();
        let proof = pow.search(100);
        assert!(pow.validate(100, proof));
    }

    #[test]
    fn search_is_deterministic_and_first_found() {
        let pow = ProofOfWork::new(3);
        let proof = pow.search(42);
        assert_eq!(proof, pow.search(42));
        assert!((0..proof).all(|candidate| !pow.validate(42, candidate)));
    }

    #[test]
    fn unreachable_target_rejects_everything() {
        let pow = ProofOfWork::new(64);
        assert!(!pow.validate(0, 0));
        assert!(!pow.validate(100, 12345));
    }

    #[test]
    fn cancelled_search_stops() {
        let pow = ProofOfWork::new(64);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(pow.search_cancellable(1, &token), None);
    }

    #[test]
    fn difficulty_is_capped_at_digest_length() {
        assert_eq!(ProofOfWork::new(1000).leading_zeros(), 64);
    }
}
