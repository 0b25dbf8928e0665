use blockwatch_types::BlockHash;

/// Trait for records that participate in a hash chain.
pub trait ChainLink {
    /// The record's stored hash.
    fn self_hash(&self) -> BlockHash;
    /// The stored link to the previous record ([`BlockHash::ZERO`] for genesis).
    fn previous_hash(&self) -> BlockHash;
    /// Hash recomputed from the record's current fields.
    fn compute_hash(&self) -> BlockHash;
}

/// Hash chain integrity verifier.
///
/// Verifies that a sequence of records forms a valid hash chain:
/// the first record links to the zero sentinel, each later record's
/// `previous_hash` matches its predecessor's `self_hash`, and every stored
/// hash matches the hash recomputed from the record's fields.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first violation.
    pub fn verify_chain<L: ChainLink>(links: &[L]) -> Result<(), ChainError> {
        match Self::walk(links, true).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Walk the whole chain and collect every violation, in chain order.
    pub fn violations<L: ChainLink>(links: &[L]) -> Vec<ChainError> {
        Self::walk(links, false)
    }

    fn walk<L: ChainLink>(links: &[L], stop_at_first: bool) -> Vec<ChainError> {
        let mut found = Vec::new();

        for (index, link) in links.iter().enumerate() {
            let expected_prev = match index {
                0 => BlockHash::ZERO,
                _ => links[index - 1].self_hash(),
            };
            if link.previous_hash() != expected_prev {
                found.push(match index {
                    0 => ChainError::GenesisLinked,
                    _ => ChainError::BrokenLink { index },
                });
                if stop_at_first {
                    return found;
                }
            }

            if link.compute_hash() != link.self_hash() {
                found.push(ChainError::HashMismatch { index });
                if stop_at_first {
                    return found;
                }
            }
        }

        found
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis block links to a predecessor (should be the zero sentinel)")]
    GenesisLinked,

    #[error("broken link at index {index}: previous_hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

impl ChainError {
    /// Position in the chain where the violation was detected.
    pub fn index(&self) -> usize {
        match self {
            Self::GenesisLinked => 0,
            Self::BrokenLink { index } | Self::HashMismatch { index } => *index,
        }
    }
}
