use std::fmt;

use blockwatch_crypto::{ChainError, HashChainVerifier};

use crate::block::Block;

/// Result of an exhaustive chain audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub block_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Audit every block in `blocks`, collecting all violations.
    pub fn audit(blocks: &[Block]) -> Self {
        let violations = HashChainVerifier::violations(blocks)
            .iter()
            .map(Violation::from)
            .collect();
        Self {
            block_count: blocks.len(),
            violations,
        }
    }

    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Index of the earliest violation, if any.
    pub fn first_violation(&self) -> Option<usize> {
        self.violations.iter().map(|v| v.index).min()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub index: usize,
    pub kind: ViolationKind,
    pub description: String,
}

impl From<&ChainError> for Violation {
    fn from(err: &ChainError) -> Self {
        Self {
            index: err.index(),
            kind: ViolationKind::from(err),
            description: err.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// The genesis block does not carry the zero sentinel.
    GenesisLinked,
    /// `previous_hash` does not match the predecessor's `self_hash`.
    BrokenLink,
    /// Stored `self_hash` differs from the recomputed digest.
    HashMismatch,
}

impl From<&ChainError> for ViolationKind {
    fn from(err: &ChainError) -> Self {
        match err {
            ChainError::GenesisLinked => Self::GenesisLinked,
            ChainError::BrokenLink { .. } => Self::BrokenLink,
            ChainError::HashMismatch { .. } => Self::HashMismatch,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GenesisLinked => "genesis block is linked",
            Self::BrokenLink => "previous hash link mismatch",
            Self::HashMismatch => "block hash does not match computed",
        };
        write!(f, "{s}")
    }
}
