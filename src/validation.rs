//! Structural and proof-of-work validation of candidate chains.

use crate::block::Block;
use crate::pow::ProofOfWork;
use tracing::debug;

/// Whether a candidate chain is internally consistent: every block links to
/// the canonical digest of its predecessor and carries a proof that validates
/// against the predecessor's.
///
/// Acceptance is all-or-nothing; a single bad link rejects the whole
/// candidate. Chains of length 0 or 1 are trivially valid, and the genesis
/// linkage sentinel is never re-derived.
pub fn is_valid_chain(chain: &[Block], pow: &ProofOfWork) -> bool {
    for pair in chain.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        if cur.previous_hash != prev.canonical_hash() {
            debug!(index = cur.index, "candidate rejected: previous-hash mismatch");
            return false;
        }
        if !pow.validate(prev.proof, cur.proof) {
            debug!(index = cur.index, "candidate rejected: proof-of-work link failed");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Transaction;
    use crate::ledger::Ledger;

    /// Mine a chain of `length` blocks the way a real node would.
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

    #[test]
    fn short_chains_are_trivially_valid() {
        let pow = ProofOfWork::default();
        assert!(is_valid_chain(&[], &pow));
        assert!(is_valid_chain(Ledger::new().chain(), &pow));
    }

    #[test]
    fn self_mined_chain_is_valid() {
        let pow = ProofOfWork::default();
        let chain = mined_chain(3, &pow);
        assert!(is_valid_chain(&chain, &pow));
    }

    #[test]
    fn tampered_previous_hash_invalidates() {
        let pow = ProofOfWork::default();
        let mut chain = mined_chain(3, &pow);
        chain[1].previous_hash = "deadbeef".to_string();
        assert!(!is_valid_chain(&chain, &pow));
    }

    #[test]
    fn tampered_middle_block_breaks_linkage() {
        let pow = ProofOfWork::default();
        let mut chain = mined_chain(3, &pow);
        // Any change to a sealed block shifts its digest, so the successor's
        // linkage no longer matches.
        chain[1].transactions.push(Transaction::new(
            "mallory".to_string(),
            "mallory".to_string(),
            1_000_000.0,
        ));
        assert!(!is_valid_chain(&chain, &pow));
    }

    #[test]
    fn tampered_tip_proof_invalidates() {
        let pow = ProofOfWork::default();
        let mut chain = mined_chain(3, &pow);

        let last_proof = chain[1].proof;
        let mut bad = chain[2].proof + 1;
        while pow.validate(last_proof, bad) {
            bad += 1;
        }
        chain[2].proof = bad;
        assert!(!is_valid_chain(&chain, &pow));
    }
}
