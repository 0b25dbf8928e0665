use tracing::debug;

use blockwatch_crypto::HashChainVerifier;
use blockwatch_types::{BlockHash, Timestamp};

use crate::block::Block;
use crate::error::LedgerError;
use crate::validation::ValidationReport;

/// In-memory, append-only chain of [`Block`]s.
///
/// Index 0 is always the genesis block (empty payload, zero sentinel link).
/// The only mutation is [`Ledger::append`], which takes `&mut self`: a
/// ledger has exactly one writer at a time. Readers that run concurrently
/// with the writer must bring their own synchronization.
#[derive(Clone, Debug)]
pub struct Ledger {
    pub(crate) blocks: Vec<Block>,
    tail_hash: BlockHash,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        let genesis = Block::new(Vec::new(), BlockHash::ZERO);
        let tail_hash = genesis.self_hash();
        debug!(hash = %genesis.self_hash().short_hex(), "genesis block created");
        Self {
            blocks: vec![genesis],
            tail_hash,
        }
    }

    /// Append a block carrying `payload`, linked to the current tail.
    pub fn append(&mut self, payload: impl Into<Vec<u8>>) -> &Block {
        self.append_at(payload, Timestamp::now())
    }

    /// Append a block with an explicit timestamp.
    pub fn append_at(&mut self, payload: impl Into<Vec<u8>>, created_at: Timestamp) -> &Block {
        let block = Block::with_timestamp(payload, created_at, self.tail_hash);
        self.tail_hash = block.self_hash();
        debug!(
            index = self.blocks.len(),
            bytes = block.payload().len(),
            hash = %block.self_hash().short_hex(),
            "block appended"
        );
        self.blocks.push(block);
        self.tail()
    }

    /// Returns `true` if every block is linked to its predecessor and
    /// self-consistent.
    pub fn verify(&self) -> bool {
        self.validate().is_ok()
    }

    /// Walk the chain from genesis, failing on the first violation.
    pub fn validate(&self) -> Result<(), LedgerError> {
        HashChainVerifier::verify_chain(&self.blocks)?;
        Ok(())
    }

    /// Audit the whole chain, collecting every violation.
    pub fn report(&self) -> ValidationReport {
        ValidationReport::audit(&self.blocks)
    }

    /// All blocks in append order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// The most recently appended block (genesis on a fresh ledger).
    pub fn tail(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Hash the next appended block will link to.
    pub fn tail_hash(&self) -> BlockHash {
        self.tail_hash
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing has been appended since genesis.
    pub fn is_genesis_only(&self) -> bool {
        self.blocks.len() == 1
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::validation::ViolationKind;

    #[test]
    fn fresh_ledger_holds_only_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_genesis_only());
        assert!(ledger.genesis().previous_hash().is_zero());
        assert!(ledger.genesis().payload().is_empty());
        assert_eq!(ledger.tail_hash(), ledger.genesis().self_hash());
        assert!(ledger.verify());
    }

    #[test]
    fn two_transactions_form_a_valid_chain() {
        let mut ledger = Ledger::new();
        ledger.append("first transaction");
        ledger.append("Second transaction");

        assert_eq!(ledger.len(), 3);
        let blocks = ledger.blocks();
        assert_eq!(blocks[2].previous_hash(), blocks[1].self_hash());
        assert_eq!(blocks[1].previous_hash(), blocks[0].self_hash());
        assert_eq!(blocks[1].payload(), b"first transaction");
        assert_eq!(blocks[2].payload(), b"Second transaction");
        assert!(ledger.verify());
    }

    #[test]
    fn append_returns_new_tail() {
        let mut ledger = Ledger::new();
        let genesis_hash = ledger.tail_hash();
        let appended = ledger.append("payload").clone();

        assert_eq!(appended.previous_hash(), genesis_hash);
        assert_eq!(ledger.tail(), &appended);
        assert_eq!(ledger.tail_hash(), appended.self_hash());
    }

    #[test]
    fn append_at_uses_given_timestamp() {
        let mut ledger = Ledger::new();
        let ts = Timestamp::from_millis(42);
        assert_eq!(ledger.append_at("x", ts).created_at(), ts);
        assert!(ledger.verify());
    }

    #[test]
    fn identical_payloads_are_both_kept() {
        let mut ledger = Ledger::new();
        ledger.append("same");
        ledger.append("same");
        assert_eq!(ledger.len(), 3);
        assert_ne!(ledger.blocks()[1].self_hash(), ledger.blocks()[2].self_hash());
    }

    #[test]
    fn verify_is_repeatable() {
        let mut ledger = Ledger::new();
        ledger.append("a");
        ledger.append("b");
        let first = ledger.verify();
        for _ in 0..5 {
            assert_eq!(ledger.verify(), first);
        }
        assert_eq!(ledger.report(), ledger.report());
    }

    fn tampered(mutate: impl Fn(&mut Block)) -> Ledger {
        let mut ledger = Ledger::new();
        for i in 0..4 {
            ledger.append(format!("tx-{i}"));
        }
        mutate(&mut ledger.blocks[2]);
        ledger
    }

    #[test]
    fn tampered_payload_detected() {
        let ledger = tampered(|b| b.payload = b"forged".to_vec());
        assert!(!ledger.verify());
        assert_eq!(
            ledger.validate(),
            Err(LedgerError::IntegrityViolation {
                index: 2,
                kind: ViolationKind::HashMismatch
            })
        );
    }

    #[test]
    fn tampered_timestamp_detected() {
        let ledger = tampered(|b| b.created_at = Timestamp::from_millis(0));
        assert!(!ledger.verify());
    }

    #[test]
    fn tampered_previous_hash_detected() {
        let ledger = tampered(|b| b.previous_hash = BlockHash::from_digest([7; 32]));
        assert_eq!(
            ledger.validate(),
            Err(LedgerError::IntegrityViolation {
                index: 2,
                kind: ViolationKind::BrokenLink
            })
        );
    }

    #[test]
    fn tampered_self_hash_detected() {
        let ledger = tampered(|b| b.self_hash = BlockHash::from_digest([8; 32]));
        let report = ledger.report();
        assert_eq!(report.first_violation(), Some(2));
        assert!(report
            .violations
            .iter()
            .any(|v| v.index == 3 && v.kind == ViolationKind::BrokenLink));
    }

    #[test]
    fn rehashed_forgery_still_breaks_successor() {
        let ledger = tampered(|b| {
            b.payload = b"forged".to_vec();
            b.self_hash = Block::with_timestamp(b.payload.clone(), b.created_at, b.previous_hash)
                .self_hash();
        });
        assert_eq!(
            ledger.validate(),
            Err(LedgerError::IntegrityViolation {
                index: 3,
                kind: ViolationKind::BrokenLink
            })
        );
    }

    proptest! {
        #[test]
        fn length_is_genesis_plus_appends(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..32)
        ) {
            let mut ledger = Ledger::new();
            for payload in &payloads {
                ledger.append(payload.clone());
            }
            prop_assert_eq!(ledger.len(), payloads.len() + 1);
            prop_assert!(ledger.verify());
        }

        #[test]
        fn every_block_links_to_predecessor(
            payloads in proptest::collection::vec(".{0,32}", 1..24)
        ) {
            let mut ledger = Ledger::new();
            for payload in &payloads {
                ledger.append(payload.as_bytes());
            }
            let blocks = ledger.blocks();
            for i in 1..blocks.len() {
                prop_assert_eq!(blocks[i].previous_hash(), blocks[i - 1].self_hash());
                prop_assert_eq!(blocks[i].payload(), payloads[i - 1].as_bytes());
            }
        }

        #[test]
        fn any_non_tail_payload_change_is_detected(
            count in 2usize..12,
            victim in 0usize..11,
        ) {
            let mut ledger = Ledger::new();
            for i in 0..count {
                ledger.append(format!("tx-{i}"));
            }
            let victim = victim % (ledger.len() - 1);
            ledger.blocks[victim].payload.push(0xff);
            prop_assert!(!ledger.verify());
            prop_assert_eq!(ledger.report().first_violation(), Some(victim));
        }
    }
}
