use blockwatch_crypto::ChainError;

use crate::validation::ViolationKind;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("integrity violation at index {index}: {kind}")]
    IntegrityViolation { index: usize, kind: ViolationKind },
}

impl From<ChainError> for LedgerError {
    fn from(err: ChainError) -> Self {
        Self::IntegrityViolation {
            index: err.index(),
            kind: ViolationKind::from(&err),
        }
    }
}
