use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use blockwatch_crypto::{ChainLink, ContentHasher};
use blockwatch_types::{BlockHash, Timestamp};

/// A single immutable ledger record.
///
/// The `self_hash` is a BLAKE3 digest over (payload, created_at,
/// previous_hash), so changing any field after construction is detectable.
/// Fields are only reachable through read accessors outside this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) payload: Vec<u8>,
    pub(crate) created_at: Timestamp,
    pub(crate) previous_hash: BlockHash,
    pub(crate) self_hash: BlockHash,
}

impl Block {
    /// Build a block stamped with the current wall-clock time.
    pub fn new(payload: impl Into<Vec<u8>>, previous_hash: BlockHash) -> Self {
        Self::with_timestamp(payload, Timestamp::now(), previous_hash)
    }

    /// Build a block with an explicit timestamp.
    pub fn with_timestamp(
        payload: impl Into<Vec<u8>>,
        created_at: Timestamp,
        previous_hash: BlockHash,
    ) -> Self {
        let payload = payload.into();
        let self_hash = Self::digest(&payload, created_at, previous_hash);
        Self {
            payload,
            created_at,
            previous_hash,
            self_hash,
        }
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload decoded as UTF-8, with invalid sequences replaced.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn previous_hash(&self) -> BlockHash {
        self.previous_hash
    }

    pub fn self_hash(&self) -> BlockHash {
        self.self_hash
    }

    /// Returns `true` if this block links to the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_zero()
    }

    /// Returns `true` if the stored hash matches the block's fields.
    pub fn is_self_consistent(&self) -> bool {
        self.compute_hash() == self.self_hash
    }

    fn digest(payload: &[u8], created_at: Timestamp, previous_hash: BlockHash) -> BlockHash {
        ContentHasher::BLOCK.digest(&[
            payload,
            created_at.to_le_bytes().as_slice(),
            previous_hash.as_bytes().as_slice(),
        ])
    }
}

impl ChainLink for Block {
    fn self_hash(&self) -> BlockHash {
        self.self_hash
    }

    fn previous_hash(&self) -> BlockHash {
        self.previous_hash
    }

    fn compute_hash(&self) -> BlockHash {
        Self::digest(&self.payload, self.created_at, self.previous_hash)
    }
}
